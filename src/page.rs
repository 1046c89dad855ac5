use minijinja::{context, Environment};

use crate::error::Result;

// The `.html` suffix turns on HTML auto-escaping.
const TEMPLATE_NAME: &str = "index.html";

/// The single form page, compiled once at startup.
pub struct Page {
    env: Environment<'static>,
}

impl Page {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, include_str!("../templates/index.html"))?;
        Ok(Self { env })
    }

    /// Renders the form, plus the submitted text and its labels when a
    /// prediction is given.
    pub fn render(&self, content: Option<&str>, prediction: Option<&[String]>) -> Result<String> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(context! {
            content => content,
            prediction => prediction,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_form() {
        let html = Page::new().unwrap().render(None, None).unwrap();
        assert!(html.contains(r#"<form action="/predict" method="post">"#));
        assert!(html.contains(r#"name="content""#));
        assert!(!html.contains(r#"id="prediction""#));
        assert!(!html.contains("none"));
    }

    #[test]
    fn renders_labels_in_order() {
        let labels = vec!["refund".to_owned(), "billing".to_owned(), "other".to_owned()];
        let html = Page::new()
            .unwrap()
            .render(Some("please refund me"), Some(&labels))
            .unwrap();
        assert!(html.contains("<pre id=\"submitted\">\nplease refund me</pre>"));
        let positions: Vec<usize> = labels
            .iter()
            .map(|l| html.find(&format!(r#"<li class="label">{l}</li>"#)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn keeps_leading_newline() {
        let labels = vec!["a".to_owned()];
        let html = Page::new()
            .unwrap()
            .render(Some("\nfirst line blank"), Some(&labels))
            .unwrap();
        // browsers drop one newline right after the opening tag
        assert!(html.contains("<pre id=\"submitted\">\n\nfirst line blank</pre>"));
        assert!(html.contains("placeholder=\"Paste text to classify\">\n\nfirst line blank</textarea>"));
    }

    #[test]
    fn escapes_submitted_text() {
        let labels = vec!["a".to_owned()];
        let html = Page::new()
            .unwrap()
            .render(Some(r#"<b>now & "soon""#), Some(&labels))
            .unwrap();
        assert!(html.contains("&lt;b&gt;now &amp; &quot;soon&quot;"));
        assert!(!html.contains("<b>now"));
    }
}
