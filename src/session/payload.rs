// src/session/payload.rs

//! Postback payload assembly and hidden-field harvesting.

use indexmap::IndexMap;

use crate::dom::Dom;

/// Container class the portal wraps its hidden state inputs in.
const HIDDEN_CONTAINER_CLASS: &str = "aspNetHidden";

/// Ordered field set for one postback POST.
///
/// Field order matters to the portal's form processor, so the map keeps
/// insertion order. Re-inserting a key overwrites the value in place.
#[derive(Debug, Clone, Default)]
pub struct SessionPayload {
    fields: IndexMap<String, String>,
}

impl SessionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Absorb harvested hidden fields, keeping their order.
    pub fn merge(&mut self, hidden: &IndexMap<String, String>) {
        for (key, value) in hidden {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize to `application/x-www-form-urlencoded`. This is the
    /// only place payload encoding happens.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.fields {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(&urlencoding::encode(key));
            out.push('=');
            out.push_str(&urlencoding::encode(value));
        }
        out
    }
}

/// Harvest every named `<input>` inside the hidden-state containers of
/// a page, in document order. Missing `value` attributes read as empty.
pub fn extract_hidden_fields(dom: &Dom) -> IndexMap<String, String> {
    let mut fields = IndexMap::new();

    for container in dom.get_elements_by_class_name(HIDDEN_CONTAINER_CLASS) {
        for input in container.get_elements_by_tag_name("input") {
            if let Some(name) = input.attr("name") {
                let value = input.attr("value").unwrap_or_default();
                fields.insert(name.to_string(), value.to_string());
            }
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"
      <form>
        <div class="aspNetHidden">
          <input type="hidden" name="__VIEWSTATE" value="dDw0OTk=" />
          <input type="hidden" name="__VIEWSTATEGENERATOR" value="CA0B0334" />
        </div>
        <div class="aspNetHidden">
          <input type="hidden" name="__EVENTVALIDATION" value="/wEWAg==" />
        </div>
        <input type="hidden" name="outside" value="not state" />
      </form>"#;

    #[test]
    fn harvests_only_container_inputs_in_order() {
        let fields = extract_hidden_fields(&Dom::parse(LOGIN_PAGE));
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["__VIEWSTATE", "__VIEWSTATEGENERATOR", "__EVENTVALIDATION"]
        );
        assert_eq!(fields["__VIEWSTATE"], "dDw0OTk=");
    }

    #[test]
    fn empty_page_harvests_nothing() {
        assert!(extract_hidden_fields(&Dom::parse("<p>x</p>")).is_empty());
    }

    #[test]
    fn encode_preserves_order_and_escapes() {
        let mut payload = SessionPayload::new();
        payload.insert("__EVENTTARGET", "m$Content$submitbtn2");
        payload.insert("m$Content$username", "anna møller");

        assert_eq!(
            payload.encode(),
            "__EVENTTARGET=m%24Content%24submitbtn2&m%24Content%24username=anna%20m%C3%B8ller"
        );
    }

    #[test]
    fn merge_overwrites_in_place() {
        let mut payload = SessionPayload::new();
        payload.insert("__VIEWSTATE", "old");
        payload.insert("second", "2");

        let mut hidden = IndexMap::new();
        hidden.insert("__VIEWSTATE".to_string(), "new".to_string());
        payload.merge(&hidden);

        assert_eq!(payload.get("__VIEWSTATE"), Some("new"));
        assert!(payload.encode().starts_with("__VIEWSTATE=new&"));
    }
}
