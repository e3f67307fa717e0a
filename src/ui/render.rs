//! Server-rendered HTML for the browser front end. Pages are plain strings;
//! every piece of model or user text goes through [`escape`].

use crate::config::QuizSettings;
use crate::models::quiz::QuizQuestion;
use crate::models::validation::{ValidationResult, Verdict};
use crate::ui::session::{AnswerState, StudentSession};
use crate::ui::{Mode, ReadyQuiz, UiPhase, SUBJECT_AREAS};
use crate::utils::time;

const STYLE: &str = include_str!("assets/app.css");
const SCRIPT: &str = include_str!("assets/app.js");

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn verification_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Confirmed => "Verified",
        Verdict::Contradicted => "Incorrect",
        Verdict::Inconclusive => "Inconclusive",
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <header><h1>Quiz Generator</h1>\
         <p>Generate university-level multiple-choice questions from a learning objective.</p>\
         </header>\n<main>\n{body}\n</main>\n<script>{SCRIPT}</script>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn mode_switch(mode: Mode) -> String {
    let link = |m: Mode, label: &str| {
        let class = if m == mode { " class=\"active\"" } else { "" };
        format!("<a href=\"/ui?mode={}\"{}>{}</a>", m.as_str(), class, label)
    };
    format!(
        "<nav class=\"modes\">{}{}</nav>",
        link(Mode::Teacher, "Teacher mode"),
        link(Mode::Student, "Student mode")
    )
}

fn quiz_form(mode: Mode, settings: &QuizSettings) -> String {
    let subjects: String = SUBJECT_AREAS
        .iter()
        .map(|s| format!("<option value=\"{0}\">{0}</option>", escape(s)))
        .collect();
    format!(
        r#"<form id="quiz-form" method="post" action="/ui/quiz">
<input type="hidden" name="mode" value="{mode}">
<label for="learning_objective">Learning objective</label>
<textarea id="learning_objective" name="learning_objective" rows="3" required placeholder="e.g. Explain the role of mitochondria in cellular respiration"></textarea>
<div class="row">
<label>Number of questions <input type="number" name="num_questions" min="{min}" max="{max}" value="{default}"></label>
<label>Subject area <select name="subject_area">{subjects}</select></label>
<label class="check"><input type="checkbox" name="validate" value="on"> Validate answers with web search</label>
</div>
<button type="submit">Generate quiz</button>
<p id="generating" class="notice" hidden>Generating your quiz. This may take a moment.</p>
</form>"#,
        mode = mode.as_str(),
        min = settings.min_num_questions,
        max = settings.max_num_questions,
        default = settings.default_num_questions,
    )
}

/// The start page, optionally with an error from a failed attempt.
pub fn index(mode: Mode, settings: &QuizSettings, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!("<p class=\"error\">{}</p>", escape(e)))
        .unwrap_or_default();
    page(
        "Quiz Generator",
        &format!("{}{}{}", mode_switch(mode), error, quiz_form(mode, settings)),
    )
}

pub fn phase(phase: &UiPhase, mode: Mode, settings: &QuizSettings) -> String {
    match phase {
        UiPhase::Idle { error } => index(mode, settings, error.as_ref().map(|e| e.message.as_str())),
        UiPhase::Generating { plan } => page(
            "Generating quiz",
            &format!(
                "{}<p class=\"notice\">Generating {} questions on: '{}'</p>",
                mode_switch(mode),
                plan.num_questions,
                escape(&plan.learning_objective)
            ),
        ),
        UiPhase::Ready(quiz) => match mode {
            Mode::Teacher => teacher_view(quiz),
            Mode::Student => student_view(quiz),
        },
    }
}

fn options_list(question: &QuizQuestion, mark: impl Fn(&str) -> &'static str) -> String {
    let items: String = question
        .labelled_options()
        .map(|(label, text)| {
            format!(
                "<li class=\"{}\"><b>{})</b> {}</li>",
                mark(label),
                label.to_ascii_uppercase(),
                escape(text)
            )
        })
        .collect();
    format!("<ul class=\"options\">{}</ul>", items)
}

fn validation_block(result: &ValidationResult) -> String {
    let sources: String = result
        .sources
        .iter()
        .map(|s| format!("<li><a href=\"{0}\" rel=\"noopener\" target=\"_blank\">{0}</a></li>", escape(s)))
        .collect();
    let sources = if sources.is_empty() {
        String::new()
    } else {
        format!("<p><b>Sources:</b></p><ul class=\"sources\">{}</ul>", sources)
    };
    let confidence = result
        .confidence
        .map(|c| format!(" ({:.0}% confidence)", c * 100.0))
        .unwrap_or_default();
    format!(
        "<div class=\"validation {verdict}\"><p><b>Validation status:</b> {label}{confidence}</p>\
         <p><b>Validation notes:</b> {notes}</p>{sources}</div>",
        verdict = result.verdict.as_str(),
        label = verification_label(result.verdict),
        notes = escape(&result.explanation),
    )
}

fn quiz_header(title: &str, quiz: &ReadyQuiz) -> String {
    format!(
        "<h2>{} {}</h2><p class=\"meta\"><b>Quiz ID:</b> {} | <b>Generated at:</b> \
         <time datetime=\"{}\">{}</time> | <b>Questions:</b> {}</p>",
        title,
        escape(&quiz.objective),
        escape(&quiz.id),
        time::to_rfc3339(quiz.generated_at),
        time::clock_label(quiz.generated_at),
        quiz.response.questions.len()
    )
}

/// Questions with answers, explanations and validation notes, plus the quiz
/// JSON for download.
pub fn teacher_view(quiz: &ReadyQuiz) -> String {
    let mut body = mode_switch(Mode::Teacher);
    body.push_str(&quiz_header("Generated Quiz:", quiz));
    body.push_str("<button type=\"button\" data-print>Print quiz</button>");

    for (idx, q) in quiz.response.questions.iter().enumerate() {
        let validation = quiz
            .response
            .validation_for(idx)
            .map(validation_block)
            .unwrap_or_default();
        body.push_str(&format!(
            "<details class=\"question\" open><summary><b>Question {}:</b> {}</summary>{}\
             <p><b>Correct answer:</b> {}</p><p><b>Explanation:</b> {}</p>{}</details>",
            idx + 1,
            escape(&q.question),
            options_list(q, |label| if q.is_correct(label) { "correct" } else { "" }),
            q.correct_answer.to_ascii_uppercase(),
            escape(&q.explanation),
            validation
        ));
    }

    let json = serde_json::to_string_pretty(quiz).unwrap_or_default();
    body.push_str(&format!(
        "<details class=\"export\"><summary>Quiz data (JSON)</summary>\
         <button type=\"button\" data-download=\"quiz-{}.json\">Download JSON</button>\
         <pre id=\"quiz-json\">{}</pre></details>",
        escape(&quiz.id),
        escape(&json)
    ));
    body.push_str("<p><a href=\"/ui?mode=teacher\">Generate another quiz</a></p>");
    page(&format!("Quiz {}", quiz.id), &body)
}

/// Questions without visible answers. Each question can be checked in the
/// browser; submitting grades the whole quiz.
pub fn student_view(quiz: &ReadyQuiz) -> String {
    let mut body = mode_switch(Mode::Student);
    body.push_str(&quiz_header("Quiz:", quiz));
    body.push_str(
        "<p>Select one answer for each question, check it if you like, then submit the quiz \
         to see your score.</p><form id=\"student-form\" method=\"post\" action=\"/ui/results\">",
    );
    let json = serde_json::to_string(quiz).unwrap_or_default();
    body.push_str(&format!(
        "<input type=\"hidden\" name=\"quiz\" value=\"{}\">",
        escape(&json)
    ));

    for (idx, q) in quiz.response.questions.iter().enumerate() {
        let choices: String = q
            .labelled_options()
            .map(|(label, text)| {
                format!(
                    "<label class=\"choice\"><input type=\"radio\" name=\"q{}\" value=\"{}\"> \
                     <b>{})</b> {}</label>",
                    idx,
                    label,
                    label.to_ascii_uppercase(),
                    escape(text)
                )
            })
            .collect();
        body.push_str(&format!(
            "<fieldset class=\"question\" data-index=\"{idx}\" data-correct=\"{correct}\">\
             <legend>Question {num}: {text}</legend>{choices}\
             <button type=\"button\" class=\"check-answer\">Check answer</button>\
             <div class=\"reveal\" hidden><p class=\"feedback\"></p>\
             <p><b>Explanation:</b> {explanation}</p></div></fieldset>",
            idx = idx,
            correct = escape(&q.correct_answer),
            num = idx + 1,
            text = escape(&q.question),
            choices = choices,
            explanation = escape(&q.explanation),
        ));
    }
    body.push_str("<button type=\"submit\">Submit quiz</button></form>");
    page(&format!("Quiz {}", quiz.id), &body)
}

/// Score, performance tier and a per-question review.
pub fn results_view(quiz: &ReadyQuiz, session: &StudentSession) -> String {
    let card = session.scorecard();
    let tier = card.tier();
    let mut body = mode_switch(Mode::Student);
    body.push_str(&format!("<h2>Quiz Results: {}</h2>", escape(&quiz.objective)));
    if !card.is_complete() {
        body.push_str(&format!(
            "<p class=\"warning\">You've only answered {} out of {} questions.</p>",
            card.answered, card.total
        ));
    }
    body.push_str(&format!(
        "<div class=\"score {}\"><h3>Your Score: {}/{} ({:.1}%)</h3><p><b>{}</b> {}</p></div>",
        tier.css_class(),
        card.correct,
        card.total,
        card.percent(),
        tier.headline(),
        tier.message()
    ));

    body.push_str("<h3>Question Review</h3>");
    for (idx, q) in session.questions().iter().enumerate() {
        let (status, chosen) = match session.state(idx) {
            Some(AnswerState::Answered { choice, correct }) => (
                if *correct { "correct" } else { "incorrect" },
                choice.to_ascii_uppercase(),
            ),
            _ => ("unanswered", "Not answered".to_string()),
        };
        let chosen_label = match session.state(idx) {
            Some(AnswerState::Answered { choice, .. }) => Some(choice.as_str()),
            _ => None,
        };
        body.push_str(&format!(
            "<details class=\"question {status}\"><summary><b>Question {num}:</b> {text}</summary>{options}\
             <p><b>Your answer:</b> {chosen}</p><p><b>Correct answer:</b> {correct}</p>\
             <p><b>Explanation:</b> {explanation}</p></details>",
            status = status,
            num = idx + 1,
            text = escape(&q.question),
            options = options_list(q, |label| {
                if q.is_correct(label) {
                    "correct"
                } else if chosen_label == Some(label) {
                    "incorrect"
                } else {
                    ""
                }
            }),
            chosen = chosen,
            correct = q.correct_answer.to_ascii_uppercase(),
            explanation = escape(&q.explanation),
        ));
    }
    body.push_str(
        "<p>Want to improve your score? Review the explanations above and \
         <a href=\"/ui?mode=student\">try again with a new quiz</a>.</p>",
    );
    page("Quiz results", &body)
}
