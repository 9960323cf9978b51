use crate::error::Result;
use crate::session::Flash;
use crate::table::Table;
use handlebars::{Handlebars, html_escape};
use serde::Serialize;

const INDEX_TEMPLATE: &str = "index";

/// Values available to the page template
#[derive(Debug, Default, Serialize)]
pub struct Page {
    pub flashes: Vec<Flash>,
    pub filename: Option<String>,
    pub message: Option<String>,
    pub data_html: Option<String>,
    pub filter_message: Option<String>,
    pub filtered_data_html: Option<String>,
}

/// Compiled page templates
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_template_string(INDEX_TEMPLATE, include_str!("./static/index.html"))?;
        Ok(Templates { registry })
    }

    pub fn index(&self, page: &Page) -> Result<String> {
        Ok(self.registry.render(INDEX_TEMPLATE, page)?)
    }
}

/// Render a table as an HTML `<table>` for the preview panes
///
/// Every header and value is HTML-escaped. Row numbers are not shown.
pub fn table_html(table: &Table) -> String {
    let mut html = String::from(
        "<table border=\"0\" class=\"dataframe table table-striped table-sm\">\n",
    );

    html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n");
    for header in &table.headers {
        html.push_str(&format!("      <th>{}</th>\n", html_escape(header)));
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for row in &table.rows {
        html.push_str("    <tr>\n");
        for value in row {
            html.push_str(&format!("      <td>{}</td>\n", html_escape(value)));
        }
        html.push_str("    </tr>\n");
    }

    html.push_str("  </tbody>\n</table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Category;

    #[test]
    fn table_html_escapes_values() {
        let table = Table::new(
            vec!["Restaurant Name".into()],
            vec![vec!["<b>Fish & Chips</b>".into()]],
        );
        let html = table_html(&table);
        assert!(html.starts_with("<table border=\"0\" class=\"dataframe table table-striped table-sm\">"));
        assert!(html.contains("<th>Restaurant Name</th>"));
        assert!(html.contains("&lt;b&gt;Fish &amp; Chips&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn table_html_layout() {
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "2".into()], vec!["3".into(), "".into()]],
        );
        assert_eq!(
            table_html(&table),
            "<table border=\"0\" class=\"dataframe table table-striped table-sm\">\n\
             \x20 <thead>\n\
             \x20   <tr style=\"text-align: right;\">\n\
             \x20     <th>a</th>\n\
             \x20     <th>b</th>\n\
             \x20   </tr>\n\
             \x20 </thead>\n\
             \x20 <tbody>\n\
             \x20   <tr>\n\
             \x20     <td>1</td>\n\
             \x20     <td>2</td>\n\
             \x20   </tr>\n\
             \x20   <tr>\n\
             \x20     <td>3</td>\n\
             \x20     <td></td>\n\
             \x20   </tr>\n\
             \x20 </tbody>\n\
             </table>"
        );
    }

    #[test]
    fn index_renders_flashes_and_preview() {
        let templates = Templates::new().unwrap();
        let page = Page {
            flashes: vec![Flash {
                category: Category::Warning,
                message: "No file selected for upload.".to_string(),
            }],
            filename: Some("orders.csv".to_string()),
            message: Some("Displaying first 1 rows of orders.csv.".to_string()),
            data_html: Some("<table id=\"preview\"></table>".to_string()),
            ..Page::default()
        };

        let html = templates.index(&page).unwrap();
        assert!(html.contains("alert-warning"));
        assert!(html.contains("No file selected for upload."));
        assert!(html.contains("orders.csv"));
        assert!(html.contains("<table id=\"preview\"></table>"));
        assert!(!html.contains("filtered-results"));
    }

    #[test]
    fn index_without_upload() {
        let html = Templates::new().unwrap().index(&Page::default()).unwrap();
        assert!(html.contains("No file uploaded yet"));
    }
}
