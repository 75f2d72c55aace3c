use super::html::Element;
use crate::{api::types::AccessPoint, core::table::KnownAps};

/// `id` of the `<tbody>` the setup view renders into.
pub const TABLE_BODY_ID: &str = "wifi-networks";

const COLUMNS: usize = 4;

/// Row shown while the first scan is still outstanding.
pub fn placeholder_row() -> String {
    Element::new("tr")
        .child(
            Element::new("td")
                .attr("colspan", COLUMNS.to_string())
                .text("Scanning..."),
        )
        .to_html()
}

/// One row per known network, in table order.
pub fn render_table_body(known: &KnownAps) -> String {
    known.iter().map(|ap| access_point_row(ap).to_html()).collect()
}

fn access_point_row(ap: &AccessPoint) -> Element {
    let connect = Element::new("button")
        .attr("type", "button")
        .attr("class", "btn btn-primary wifi-connect")
        .attr("data-ssid", ap.ssid.as_str())
        .text("Connect");

    Element::new("tr").children([
        Element::new("td").text(ap.ssid.as_str()),
        Element::new("td").text(ap.auth.as_str()),
        Element::new("td").text(ap.quality.to_string()),
        Element::new("td").child(connect),
    ])
}

/// Wrap a rendered table body into a standalone page.
///
/// `body` must come from [`render_table_body`] or [`placeholder_row`]; it is
/// inserted verbatim.
pub fn render_page(body: &str, refresh_secs: Option<u64>) -> String {
    let refresh = refresh_secs
        .map(|secs| {
            Element::new("meta")
                .attr("http-equiv", "refresh")
                .attr("content", secs.to_string())
                .to_html()
        })
        .unwrap_or_default();
    let header = Element::new("thead").child(
        Element::new("tr")
            .child(Element::new("th").text("SSID"))
            .child(Element::new("th").text("Auth"))
            .child(Element::new("th").text("Quality"))
            .child(Element::new("th")),
    );

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">{refresh}<title>Setup WiFi</title></head>\
         <body><h1>Setup WiFi</h1><table class=\"table\">{header}<tbody id=\"{TABLE_BODY_ID}\">{body}</tbody></table></body></html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_layout() {
        let mut known = KnownAps::new();
        known.upsert(AccessPoint::new("home", "WPA2", 80.0));
        assert_eq!(
            render_table_body(&known),
            "<tr><td>home</td><td>WPA2</td><td>80</td><td>\
             <button type=\"button\" class=\"btn btn-primary wifi-connect\" data-ssid=\"home\">Connect</button>\
             </td></tr>"
        );
    }

    #[test]
    fn test_render_is_idempotent_and_ordered() {
        let mut known = KnownAps::new();
        known.upsert(AccessPoint::new("zulu", "Open", 12.5));
        known.upsert(AccessPoint::new("alpha", "WPA2", 99.0));

        let first = render_table_body(&known);
        let second = render_table_body(&known);
        assert_eq!(first, second);
        assert!(first.find("alpha").unwrap() < first.find("zulu").unwrap());
        assert!(first.contains("<td>12.5</td>"));
    }

    #[test]
    fn test_markup_in_ssid_is_escaped() {
        let mut known = KnownAps::new();
        known.upsert(AccessPoint::new("<img src=x onerror=alert(1)>", "Open", 5.0));
        let html = render_table_body(&known);
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        assert_eq!(render_table_body(&KnownAps::new()), "");
        assert_eq!(
            placeholder_row(),
            "<tr><td colspan=\"4\">Scanning...</td></tr>"
        );
    }

    #[test]
    fn test_page_wraps_body() {
        let page = render_page(&placeholder_row(), Some(5));
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<meta http-equiv=\"refresh\" content=\"5\">"));
        assert!(page.contains("<tbody id=\"wifi-networks\"><tr><td colspan=\"4\">Scanning...</td></tr></tbody>"));
        assert!(!render_page("", None).contains("refresh"));
    }
}
