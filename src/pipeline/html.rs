//! HTML assembly: cover page, table of contents and one card per recipe.
//!
//! The stylesheet targets CSS paged media. `@page` puts a page counter in
//! the bottom margin and `.toc-page::after { target-counter(...) }` fills in
//! the page number of each recipe in the table of contents, so the TOC links
//! must point at element ids that exist further down the document.
//!
//! Every piece of record text goes through [`escape_html`]; nothing from the
//! archive is ever interpolated raw.

use crate::output::Recipe;
use crate::pipeline::text::{escape_html, slugify};
use std::fmt::Write as _;

const STYLESHEET: &str = r#"
        @import url('https://fonts.googleapis.com/css2?family=Playfair+Display:ital,wght@0,400;0,700;1,400&family=Lato:wght@400;700&family=Merriweather:ital,wght@0,300;0,400;0,700;1,300&display=swap');

        @media print {
            @page {
                margin: 1.5cm;
                @bottom-center { content: "Page " counter(page); font-family: 'Lato', sans-serif; font-size: 9pt; color: #999; }
            }
            body { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
            .no-print { display: none; }
            .page-break { page-break-after: always; }
            .avoid-break { page-break-inside: avoid; }
            .cover-page { page-break-after: always; margin: 0; height: 100%; }
        }

        body { font-family: 'Merriweather', serif; color: #333; line-height: 1.45; margin: 0; padding: 0; background: #fff; }
        .container { max-width: 900px; margin: 0 auto; padding: 20px; }

        .cover-page { text-align: center; padding: 40px 20px; border: 6px double #2c3e50; height: 85vh; display: flex; flex-direction: column; justify-content: center; align-items: center; background-color: #fdfbf7; box-sizing: border-box; margin-bottom: 0; }
        .cover-subtitle { font-family: 'Lato', sans-serif; text-transform: uppercase; letter-spacing: 3px; font-size: 0.9rem; color: #e67e22; margin-bottom: 15px; }
        .cover-title { font-family: 'Playfair Display', serif; font-size: 3.8rem; line-height: 1.1; color: #2c3e50; margin: 10px 0; font-style: italic; }
        .cover-author { font-family: 'Playfair Display', serif; font-size: 1.3rem; color: #555; margin-top: 30px; font-weight: normal; }
        .cover-author strong { display: block; font-size: 1.8rem; color: #2c3e50; margin-top: 8px; }
        .cover-year { margin-top: auto; font-family: 'Lato', sans-serif; color: #999; font-size: 0.8rem; padding-top: 20px; }
        .cover-icon { font-size: 2.5rem; color: #e67e22; margin: 15px 0; }

        .toc-container { padding: 20px 0; }
        .toc-title { font-family: 'Playfair Display', serif; font-size: 2.2rem; text-align: center; color: #2c3e50; margin-bottom: 30px; border-bottom: 2px solid #e67e22; display: inline-block; padding-bottom: 8px; width: 100%; }
        .toc-list { column-count: 2; column-gap: 40px; list-style: none; padding: 0; font-family: 'Lato', sans-serif; }
        .toc-item { margin-bottom: 6px; break-inside: avoid; page-break-inside: avoid; font-size: 0.9rem; }
        .toc-item a { text-decoration: none; color: #333; display: flex; align-items: baseline; width: 100%; }
        .toc-dots { flex-grow: 1; border-bottom: 1px dotted #aaa; margin: 0 5px; position: relative; top: -4px; }
        .toc-page { font-family: 'Lato', sans-serif; color: #666; font-size: 0.85rem; min-width: 25px; text-align: right; }
        .toc-page::after { content: target-counter(attr(href), page); }

        .recipe-card { margin-bottom: 30px; padding-bottom: 20px; border-bottom: 1px dashed #ccc; padding-top: 10px; page-break-after: always; }
        h1 { font-family: 'Playfair Display', serif; font-size: 2.0rem; color: #2c3e50; text-align: center; margin-bottom: 5px; margin-top: 0; }
        .description { text-align: center; font-style: italic; color: #666; font-size: 0.9rem; margin: 0 auto 10px; max-width: 80%; }
        .meta-info-container { text-align: center; margin-bottom: 15px; }
        .meta-info { display: inline-block; font-family: 'Lato', sans-serif; font-size: 0.8rem; color: #e67e22; text-transform: uppercase; letter-spacing: 1.5px; font-weight: 700; border-top: 1px solid #e67e22; border-bottom: 1px solid #e67e22; padding: 3px 12px; }
        .categories { text-align: center; font-family: 'Lato', sans-serif; font-size: 0.75rem; color: #999; margin-top: -8px; margin-bottom: 12px; }

        table.layout-table { width: 100%; border-collapse: collapse; border: none; }
        td { vertical-align: top; }
        td.sidebar-cell { width: 30%; padding-right: 20px; }
        td.main-cell { width: 70%; padding-left: 15px; border-left: 1px solid #eee; }

        .sidebar-image { width: 100%; height: auto; border-radius: 4px; margin-bottom: 15px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); border: 3px solid white; }
        h3 { font-family: 'Lato', sans-serif; font-size: 0.95rem; color: #2c3e50; margin-top: 0; text-transform: uppercase; border-bottom: 2px solid #e67e22; padding-bottom: 4px; margin-bottom: 8px; letter-spacing: 0.5px; }
        ul { padding-left: 0; margin: 0; list-style: none; }
        li { margin-bottom: 4px; font-size: 0.9rem; border-bottom: 1px dotted #ddd; padding-bottom: 2px; }

        .step { margin-bottom: 8px; text-align: justify; position: relative; padding-left: 25px; font-size: 0.95rem; }
        .step:before { content: attr(data-step); position: absolute; left: 0; top: 0; font-weight: bold; color: white; background: #e67e22; border-radius: 50%; width: 18px; height: 18px; text-align: center; line-height: 18px; font-size: 0.7rem; font-family: 'Lato', sans-serif; }
        .notes { margin-top: 12px; padding: 10px; background: #fffcf5; font-size: 0.85rem; border-left: 3px solid #e67e22; font-style: italic; white-space: pre-line; }
        .source { margin-top: 10px; font-family: 'Lato', sans-serif; font-size: 0.75rem; color: #999; }
        .footer { text-align: center; margin-top: 50px; padding-top: 20px; border-top: 1px solid #eee; color: #888; font-family: 'Lato', sans-serif; font-size: 0.8rem; }
"#;

const META_SEPARATOR: &str = " &nbsp;&bull;&nbsp; ";

/// Anchor ids for `recipes`, in the same order: `recipe-{n}-{slug}`.
///
/// The 1-based position keeps ids unique when two recipes share a name.
pub fn anchor_ids(recipes: &[Recipe]) -> Vec<String> {
    recipes
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let slug = slugify(&r.name);
            if slug.is_empty() {
                format!("recipe-{}", i + 1)
            } else {
                format!("recipe-{}-{}", i + 1, slug)
            }
        })
        .collect()
}

/// Assemble the complete document. `recipes` must already be in final order.
pub fn render_document(recipes: &[Recipe], author: &str, year: i32, extended: bool) -> String {
    let anchors = anchor_ids(recipes);
    let mut html = String::with_capacity(16 * 1024 + recipes.len() * 4096);

    html.push_str(&render_head());
    html.push_str(&render_cover(author, year));
    html.push_str(&render_toc(recipes, &anchors));
    for (recipe, anchor) in recipes.iter().zip(&anchors) {
        html.push_str(&render_recipe(recipe, anchor, extended));
    }
    let _ = write!(
        html,
        "<div class=\"footer no-print\">Compiled by {}</div>\n    </div>\n</body>\n</html>\n",
        escape_html(author)
    );
    html
}

fn render_head() -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    \
         <title>Recipe Collection</title>\n    <style>{STYLESHEET}    </style>\n</head>\n<body>\n    \
         <div class=\"container\">\n"
    )
}

/// The cover: "My Personal Recipe Collection from the kitchen of {author}".
pub fn render_cover(author: &str, year: i32) -> String {
    format!(
        r#"
    <div class="cover-page">
        <div class="cover-subtitle">My Personal</div>
        <div class="cover-title">Recipe<br>Collection</div>
        <div class="cover-icon">&#9832;</div>
        <div class="cover-author">from the kitchen of<br><strong>{}</strong></div>
        <div class="cover-year">{}</div>
    </div>
"#,
        escape_html(author),
        year
    )
}

/// Two-column table of contents linking to each recipe's anchor.
pub fn render_toc(recipes: &[Recipe], anchors: &[String]) -> String {
    let mut items = String::new();
    for (recipe, anchor) in recipes.iter().zip(anchors) {
        let _ = write!(
            items,
            r##"
            <li class="toc-item">
                <a href="#{anchor}">
                    <span>{name}</span>
                    <span class="toc-dots"></span>
                    <span class="toc-page" href="#{anchor}"></span>
                </a>
            </li>"##,
            anchor = anchor,
            name = escape_html(&recipe.name),
        );
    }
    format!(
        r#"
    <div class="toc-container">
        <div class="toc-title">Table of Contents</div>
        <ul class="toc-list">{items}
        </ul>
    </div>
    <div class="page-break"></div>
"#
    )
}

/// `Prep: … • Cook: … • Serv.: …`, or `&nbsp;` when all are empty.
pub fn render_meta(recipe: &Recipe, extended: bool) -> String {
    let mut meta = Vec::with_capacity(4);
    if !recipe.prep_time.is_empty() {
        meta.push(format!("Prep: {}", escape_html(&recipe.prep_time)));
    }
    if !recipe.cook_time.is_empty() {
        meta.push(format!("Cook: {}", escape_html(&recipe.cook_time)));
    }
    if extended && !recipe.total_time.is_empty() {
        meta.push(format!("Total: {}", escape_html(&recipe.total_time)));
    }
    if !recipe.servings.is_empty() {
        meta.push(format!("Serv.: {}", escape_html(&recipe.servings)));
    }
    if meta.is_empty() {
        "&nbsp;".to_string()
    } else {
        meta.join(META_SEPARATOR)
    }
}

/// One recipe card: title, meta line, sidebar (photo + ingredients) and
/// main column (numbered steps + notes).
pub fn render_recipe(recipe: &Recipe, anchor: &str, extended: bool) -> String {
    let img_html = recipe
        .photo
        .as_ref()
        .map(|p| format!(r#"<img src="{}" class="sidebar-image">"#, p.data_uri()))
        .unwrap_or_default();

    let ing_html: String = recipe
        .ingredients
        .iter()
        .map(|i| format!("<li>{}</li>", escape_html(i)))
        .collect();

    let dir_html: String = recipe
        .directions
        .iter()
        .enumerate()
        .map(|(i, step)| {
            format!(
                r#"<div class="step" data-step="{}">{}</div>"#,
                i + 1,
                escape_html(step)
            )
        })
        .collect();

    let notes_html = if recipe.notes.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="notes"><strong>Note:</strong> {}</div>"#,
            escape_html(&recipe.notes)
        )
    };

    let mut header_extra = String::new();
    let mut footer_extra = String::new();
    if extended {
        if !recipe.description.is_empty() {
            let _ = write!(
                header_extra,
                r#"<div class="description">{}</div>"#,
                escape_html(&recipe.description)
            );
        }
        if !recipe.categories.is_empty() || recipe.rating > 0 {
            let stars = "&#9733;".repeat(recipe.rating as usize);
            let cats = recipe
                .categories
                .iter()
                .map(|c| escape_html(c))
                .collect::<Vec<_>>()
                .join(" &middot; ");
            let sep = if !stars.is_empty() && !cats.is_empty() {
                META_SEPARATOR
            } else {
                ""
            };
            let _ = write!(footer_extra, r#"<div class="categories">{cats}{sep}{stars}</div>"#);
        }
    }
    let source_html = if extended && (!recipe.source.is_empty() || !recipe.source_url.is_empty()) {
        let label = if recipe.source.is_empty() {
            &recipe.source_url
        } else {
            &recipe.source
        };
        format!(
            r#"<div class="source">Source: {}</div>"#,
            escape_html(label)
        )
    } else {
        String::new()
    };

    format!(
        r#"
    <div class="recipe-card avoid-break" id="{anchor}">
        <h1>{name}</h1>
        {header_extra}<div class="meta-info-container"><div class="meta-info">{meta}</div></div>
        {footer_extra}<table class="layout-table">
            <tr>
                <td class="sidebar-cell">{img_html}<h3>Ingredients</h3><ul>{ing_html}</ul></td>
                <td class="main-cell"><h3>Directions</h3>{dir_html}{notes_html}{source_html}</td>
            </tr>
        </table>
    </div>
"#,
        anchor = anchor,
        name = escape_html(&recipe.name),
        meta = render_meta(recipe, extended),
    )
}
