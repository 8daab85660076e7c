// src/utils/html.rs

use crate::models::question::{ChoiceLine, QuestionDetail};

/// Escapes text for HTML element and attribute contexts.
///
/// Question data comes from a static file the admin does not control, so
/// everything is rendered as plain text through `ammonia::clean_text`.
pub fn escape(input: &str) -> String {
    ammonia::clean_text(input)
}

/// Returns the URL only if it is an absolute http(s) link.
pub fn safe_link(raw: &str) -> Option<url::Url> {
    let parsed = url::Url::parse(raw.trim()).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(parsed)
}

fn field(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(
        "<div class=\"detail-field\"><span class=\"detail-label\">{}</span><span class=\"detail-value\">{}</span></div>\n",
        escape(label),
        escape(value)
    ));
}

fn choice_list(out: &mut String, choices: &[ChoiceLine]) {
    out.push_str("<ol class=\"detail-choices\">\n");
    for choice in choices {
        if choice.correct {
            out.push_str(&format!("<li class=\"correct\">{} ✓</li>\n", escape(&choice.text)));
        } else {
            out.push_str(&format!("<li>{}</li>\n", escape(&choice.text)));
        }
    }
    out.push_str("</ol>\n");
}

/// Renders the detail modal body for one question.
///
/// * Every text field is escaped.
/// * Correct choices are marked with a check.
/// * The source link is emitted only for http(s) URLs.
pub fn render_question_detail(detail: &QuestionDetail) -> String {
    let mut out = String::new();
    out.push_str(&format!("<section class=\"question-detail\" data-id=\"{}\">\n", escape(&detail.id)));

    field(&mut out, "ID", &detail.id);
    field(&mut out, "年度", &detail.year);
    field(&mut out, "カテゴリ", &detail.category);
    field(&mut out, "テーマ", &detail.theme);
    field(&mut out, "難易度", &detail.difficulty);
    field(&mut out, "タグ", &detail.tags.join(", "));
    field(&mut out, "学習目標 (JA)", &detail.learning_goal_ja);
    field(&mut out, "Learning goal (EN)", &detail.learning_goal_en);
    field(&mut out, "よくある誤解 (JA)", &detail.common_misconception_ja);
    field(&mut out, "Common misconception (EN)", &detail.common_misconception_en);

    out.push_str("<h3>日本語</h3>\n");
    field(&mut out, "問題", &detail.question_ja);
    choice_list(&mut out, &detail.choices_ja);
    field(&mut out, "解説", &detail.explanation_ja);

    out.push_str("<h3>English</h3>\n");
    field(&mut out, "Question", &detail.question_en);
    choice_list(&mut out, &detail.choices_en);
    field(&mut out, "Explanation", &detail.explanation_en);

    if let Some(link) = detail.source_url.as_deref().and_then(safe_link) {
        out.push_str(&format!(
            "<a class=\"detail-source\" href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>\n",
            escape(link.as_str()),
            escape(link.as_str())
        ));
    }

    out.push_str("</section>\n");
    out
}
