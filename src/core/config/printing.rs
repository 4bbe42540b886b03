use crate::core::config::data::Config;

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

impl Config {
    pub fn render_summary(&self) -> String {
        let unset = |value: &Option<String>| value.clone().unwrap_or_else(|| "(unset)".into());
        let mut out = String::from("Current configuration:\n");
        out.push_str(&format!("  host: {}\n", unset(&self.host)));
        out.push_str(&format!("  url: {}\n", unset(&self.url)));
        out.push_str(&format!("  markdown: {}\n", on_off(self.markdown_enabled())));
        out.push_str(&format!("  syntax: {}\n", on_off(self.syntax_enabled())));
        out.push_str(&format!("  theme: {}\n", unset(&self.theme)));
        match self.endpoint() {
            Ok(endpoint) => out.push_str(&format!("  endpoint: {endpoint}\n")),
            Err(err) => out.push_str(&format!("  endpoint: invalid ({err})\n")),
        }
        out
    }

    pub fn print_all(&self) {
        print!("{}", self.render_summary());
    }
}
