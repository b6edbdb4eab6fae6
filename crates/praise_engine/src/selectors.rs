//! XPath queries against the chat client's search panel and message cards.

/// Levels between the praised-name paragraph of a card and the message
/// container that holds its timestamp.
const CARD_TO_MESSAGE_DEPTH: usize = 19;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub search_input: String,
    pub result_list: String,
    pub timestamp_attribute: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            search_input: "//input[@id='searchInputField']".to_string(),
            result_list: "//div[@class='search-content']".to_string(),
            timestamp_attribute: "title".to_string(),
        }
    }
}

impl Selectors {
    /// The clickable search result at a 1-based position.
    pub fn result_item(&self, index: usize) -> String {
        format!(
            "{}/div[{index}]/div[contains(@data-tid, 'search-content-item')]",
            self.result_list
        )
    }

    /// Every rendered search result.
    pub fn result_items(&self) -> String {
        format!(
            "{}/div/div[contains(@data-tid, 'search-content-item')]",
            self.result_list
        )
    }

    pub fn result_author(&self, index: usize) -> String {
        format!(
            "{}/div[{index}]//div[contains(@class,'search-chat-entry-name-time')]\
             /span[contains(@class,'user-name')]",
            self.result_list
        )
    }

    pub fn result_body(&self, index: usize) -> String {
        format!(
            "{}/div[{index}]//div[contains(@class,'search-chat-body')]",
            self.result_list
        )
    }

    /// Body of the result authored by `owner`.
    pub fn body_by_author(&self, owner: &str) -> String {
        format!(
            "{}//span[contains(text(),{})]/../..//div[contains(@class,'search-chat-body')]",
            self.result_list,
            xpath_literal(owner)
        )
    }

    /// Matches only when praiser, praised first name and excerpt sit in the
    /// positions of a praise card.
    pub fn praise_card(&self, praiser: &str, praised_first_name: &str, excerpt: &str) -> String {
        format!(
            "{}/p[contains(text(), {})]/../../div[3]\
             /p[contains(text(), {})]/../../div\
             //p[contains(text(), {})]/../../../../../..\
             //span[contains(text(),'Praise')]",
            card_text_block(),
            xpath_literal(praiser),
            xpath_literal(praised_first_name),
            xpath_literal(excerpt)
        )
    }

    /// The paragraph carrying the praised full name(s) of a card.
    pub fn praised_names(&self, praiser: &str, praised_first_name: &str, excerpt: &str) -> String {
        format!(
            "{}/p[contains(text(),{})]/../../div\
             //p[contains(text(),{})]/../../div[3]\
             /p[contains(text(),{})]",
            card_text_block(),
            xpath_literal(praiser),
            xpath_literal(excerpt),
            xpath_literal(praised_first_name)
        )
    }

    /// Relative to the praised-names paragraph.
    pub fn message_timestamp(&self) -> String {
        format!(
            "./{}/div/div/div/span[@data-tid='messageTimeStamp']",
            "../".repeat(CARD_TO_MESSAGE_DEPTH)
        )
    }
}

fn card_text_block() -> &'static str {
    "//div[@class='card-body']//div[@class='ac-container']//div[@class='ac-textBlock'][1]"
}

/// Quotes `value` as an XPath 1.0 string literal.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
