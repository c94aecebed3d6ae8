//! Reply template rendering.
//!
//! Supported placeholders:
//!
//! | Placeholder      | Replacement                                   |
//! |------------------|-----------------------------------------------|
//! | `$code_id`       | author id as inline code                      |
//! | `$code_name`     | author display name as inline code            |
//! | `$mention_id`    | mention link labelled with the author id      |
//! | `$mention_name`  | mention link labelled with the author name    |
//! | `$destruct_time` | seconds until the notice is deleted           |
//! | `$keyword`       | the trigger word that matched                 |

/// Values substituted into a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContext<'a> {
    pub user_id: i64,
    pub user_name: &'a str,
    pub destruct: Option<u32>,
    pub keyword: Option<&'a str>,
}

/// Escape text for HTML-formatted messages.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn code(text: &str) -> String {
    format!("<code>{}</code>", escape(text))
}

fn mention(user_id: i64, label: &str) -> String {
    format!("<a href=\"tg://user?id={}\">{}</a>", user_id, escape(label))
}

const PLACEHOLDERS: [&str; 6] = [
    "$code_id",
    "$code_name",
    "$mention_id",
    "$mention_name",
    "$destruct_time",
    "$keyword",
];

/// Substitute placeholders in `template` in one left-to-right pass.
/// Substituted values are never scanned again.
pub fn render(template: &str, ctx: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let value = PLACEHOLDERS
            .iter()
            .find(|p| rest.starts_with(**p))
            .and_then(|p| expand(p, ctx).map(|v| (p.len(), v)));
        match value {
            Some((len, value)) => {
                out.push_str(&value);
                rest = &rest[len..];
            }
            None => {
                out.push('$');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn expand(placeholder: &str, ctx: &TemplateContext<'_>) -> Option<String> {
    let id = || ctx.user_id.to_string();
    match placeholder {
        "$code_id" => Some(code(&id())),
        "$code_name" => Some(code(ctx.user_name)),
        "$mention_id" => Some(mention(ctx.user_id, &id())),
        "$mention_name" => Some(mention(ctx.user_id, ctx.user_name)),
        "$destruct_time" => ctx.destruct.map(|secs| secs.to_string()),
        "$keyword" => ctx.keyword.map(escape),
        _ => None,
    }
}
