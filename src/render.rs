//! Render type resolution for option sets
//!
//! Independent of grouping: each field (or grid cell) with a closed value
//! domain resolves its own UI control family from that domain alone.

use serde::{Deserialize, Serialize};

use crate::config::GroupingConfig;

/// One selectable option of a closed value domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<String>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub icon: Option<String>,
}

impl OptionItem {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self { id: id.into(), code: None, display_name: display_name.into(), icon: None }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// The value used for boolean-likeness checks: the code when the
    /// server assigned one, the display name otherwise.
    fn effective_code(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.display_name)
    }
}

/// A field's closed value domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub id: String,
    pub name: String,
    pub options: Vec<OptionItem>,
}

/// UI control family for a closed value domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderType {
    YesNoButtons,
    RadioButtons,
    IconPalette,
    Dropdown,
}

fn is_boolean_like(code: &str) -> bool {
    matches!(
        code.to_ascii_uppercase().as_str(),
        "YES" | "NO" | "TRUE" | "FALSE" | "1" | "0"
    )
}

/// Map a closed value domain to a control family.
///
/// Exactly two boolean-like options render as yes/no buttons; sets up to
/// `config.max_radio_options` as radio buttons; larger sets as an icon
/// palette when any option has one, a dropdown otherwise. The radio
/// cutoff is the same tunable the category resolver uses.
pub fn resolve_render_type(option_set: &OptionSet, config: &GroupingConfig) -> RenderType {
    let options = &option_set.options;

    if options.len() == 2 && options.iter().all(|o| is_boolean_like(o.effective_code())) {
        return RenderType::YesNoButtons;
    }
    if options.len() <= config.max_radio_options {
        return RenderType::RadioButtons;
    }
    if options.iter().any(|o| o.icon.is_some()) {
        return RenderType::IconPalette;
    }
    RenderType::Dropdown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option_set(options: Vec<OptionItem>) -> OptionSet {
        OptionSet { id: "os1".to_string(), name: "Test".to_string(), options }
    }

    fn resolve(set: &OptionSet) -> RenderType {
        resolve_render_type(set, &GroupingConfig::default())
    }

    #[test]
    fn test_yes_no_pair() {
        let set = option_set(vec![OptionItem::new("o1", "YES"), OptionItem::new("o2", "NO")]);
        assert_eq!(resolve(&set), RenderType::YesNoButtons);
    }

    #[test]
    fn test_boolean_codes_case_insensitive() {
        let set = option_set(vec![
            OptionItem::new("o1", "Positive").with_code("true"),
            OptionItem::new("o2", "Negative").with_code("false"),
        ]);
        assert_eq!(resolve(&set), RenderType::YesNoButtons);
    }

    #[test]
    fn test_two_plain_options_are_radio() {
        let set = option_set(vec![OptionItem::new("o1", "Urban"), OptionItem::new("o2", "Rural")]);
        assert_eq!(resolve(&set), RenderType::RadioButtons);
    }

    #[test]
    fn test_four_options_are_radio() {
        let options = (0..4).map(|i| OptionItem::new(format!("o{}", i), format!("v{}", i)));
        assert_eq!(resolve(&option_set(options.collect())), RenderType::RadioButtons);
    }

    #[test]
    fn test_six_plain_options_are_dropdown() {
        let options = (0..6).map(|i| OptionItem::new(format!("o{}", i), format!("v{}", i)));
        assert_eq!(resolve(&option_set(options.collect())), RenderType::Dropdown);
    }

    #[test]
    fn test_large_set_with_icon_is_palette() {
        let mut options: Vec<OptionItem> =
            (0..5).map(|i| OptionItem::new(format!("o{}", i), format!("v{}", i))).collect();
        options.push(OptionItem::new("o5", "Malaria").with_icon("mosquito"));
        assert_eq!(resolve(&option_set(options)), RenderType::IconPalette);
    }

    #[test]
    fn test_radio_cutoff_follows_config() {
        // Same option set, different cutoff: the radio boundary is the
        // shared tunable, not a render-local constant.
        let options: Vec<OptionItem> =
            (0..3).map(|i| OptionItem::new(format!("o{}", i), format!("v{}", i))).collect();
        let set = option_set(options);

        assert_eq!(resolve(&set), RenderType::RadioButtons);
        let narrow = GroupingConfig { max_radio_options: 2, ..GroupingConfig::default() };
        assert_eq!(resolve_render_type(&set, &narrow), RenderType::Dropdown);
    }
}
