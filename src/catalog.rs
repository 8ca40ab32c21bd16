//! Course catalog parsing: dashboard and module listings.
//!
//! Pure functions over fetched HTML. The selectors target the course list
//! table and the condensed module outline the platform renders
//! server-side; rows that lack an expected child are skipped.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::urls::{absolutize_url, compile_static_selector};

static COURSE_ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("tr.course-list-table-row"));
static COURSE_NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(".course-list-course-title-column .name"));
static COURSE_ID_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(".course-list-star-column [data-course-id]"));

static MODULE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.item-group-condensed.context_module"));
static MODULE_NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("span.name"));
static ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("li.context_module_item"));
static ITEM_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("a.item_link"));

/// A course visible on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    /// Display name.
    pub name: String,
    /// Platform course id (numeric, kept as text).
    pub id: String,
}

/// A topic-organized group of items within a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Display name, or `"UnknownModule"` when the outline omits one.
    pub name: String,
    /// Items in document order.
    pub items: Vec<ModuleItem>,
}

/// A single link within a module, pointing at either a page or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleItem {
    /// Item title as shown in the outline.
    pub title: String,
    /// Absolute URL of the item landing page.
    pub url: String,
}

/// Extracts courses from the dashboard HTML, in document order.
#[must_use]
pub fn parse_courses(html: &str) -> Vec<Course> {
    let document = Html::parse_document(html);
    let mut courses = Vec::new();

    for row in document.select(&COURSE_ROW_SELECTOR) {
        let name = row
            .select(&COURSE_NAME_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());
        let id = row
            .select(&COURSE_ID_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("data-course-id"))
            .map(str::to_string);

        if let (Some(name), Some(id)) = (name, id)
            && !name.is_empty()
        {
            courses.push(Course { name, id });
        }
    }

    courses
}

/// Extracts modules and their items from a course's modules page.
///
/// Item hrefs are absolutized against `base_url`; items without a link are
/// skipped.
#[must_use]
pub fn parse_modules(html: &str, base_url: &Url) -> Vec<Module> {
    let document = Html::parse_document(html);
    let mut modules = Vec::new();

    for module_el in document.select(&MODULE_SELECTOR) {
        let name = module_el
            .select(&MODULE_NAME_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "UnknownModule".to_string());

        let mut items = Vec::new();
        for item_el in module_el.select(&ITEM_SELECTOR) {
            let Some(link) = item_el.select(&ITEM_LINK_SELECTOR).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Some(url) = absolutize_url(href, base_url) else {
                continue;
            };
            let title = link.text().collect::<String>().trim().to_string();
            items.push(ModuleItem { title, url });
        }

        modules.push(Module { name, items });
    }

    modules
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DASHBOARD: &str = r#"
        <table>
          <tr class="course-list-table-row">
            <td class="course-list-star-column"><span data-course-id="101"></span></td>
            <td class="course-list-course-title-column"><a><span class="name"> Systems Programming </span></a></td>
          </tr>
          <tr class="course-list-table-row">
            <td class="course-list-star-column"><span data-course-id="202"></span></td>
            <td class="course-list-course-title-column"><a><span class="name">Databases</span></a></td>
          </tr>
          <tr class="course-list-table-row">
            <td class="course-list-course-title-column"><a><span class="name">No id, skipped</span></a></td>
          </tr>
        </table>
    "#;

    #[test]
    fn test_parse_courses_in_document_order() {
        let courses = parse_courses(DASHBOARD);
        assert_eq!(
            courses,
            vec![
                Course {
                    name: "Systems Programming".to_string(),
                    id: "101".to_string()
                },
                Course {
                    name: "Databases".to_string(),
                    id: "202".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_courses_empty_html() {
        assert!(parse_courses("<html></html>").is_empty());
    }

    const MODULES: &str = r#"
        <div class="item-group-condensed context_module">
          <span class="name">Week 1</span>
          <ul>
            <li class="context_module_item">
              <a class="item_link" href="/courses/101/modules/items/1">Intro page</a>
            </li>
            <li class="context_module_item">
              <a class="item_link" href="/courses/101/modules/items/2">Syllabus</a>
            </li>
            <li class="context_module_item"><span>header row, no link</span></li>
          </ul>
        </div>
        <div class="item-group-condensed context_module">
          <ul>
            <li class="context_module_item">
              <a class="item_link" href="/courses/101/modules/items/3">Reading</a>
            </li>
          </ul>
        </div>
    "#;

    #[test]
    fn test_parse_modules_and_items() {
        let base = Url::parse("https://school.edu").unwrap();
        let modules = parse_modules(MODULES, &base);

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "Week 1");
        assert_eq!(modules[0].items.len(), 2, "linkless item is skipped");
        assert_eq!(modules[0].items[0].title, "Intro page");
        assert_eq!(
            modules[0].items[0].url,
            "https://school.edu/courses/101/modules/items/1"
        );

        assert_eq!(modules[1].name, "UnknownModule");
        assert_eq!(modules[1].items.len(), 1);
    }
}
