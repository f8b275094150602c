//! Prompt builders for every generation and evaluation call.
//!
//! Prompts are assembled here so the pipeline and interview code never embed
//! wording inline, and so tests can match calls by stable substrings
//! ("monthly goals", "weekly tasks", ...).

use crate::interview::session::InterviewSession;
use crate::pipeline::context::GenerationContext;

const JSON_ONLY: &str =
    "Respond with JSON only. Do not add commentary before or after the JSON.";

/// Title/description generation (GoalAnalyzer stage)
pub fn title_prompt(ctx: &GenerationContext) -> String {
    let mut prompt = format!(
        "Create a concise title and a 2-3 sentence description for a {}-month \
         study plan about \"{}\" in {} mode.\n",
        ctx.duration_months,
        ctx.topic,
        ctx.mode.as_str()
    );

    if let Some(context) = &ctx.interview_context {
        prompt.push_str(&format!("\nLearner context:\n{}\n", context));
    }

    if !ctx.research_notes.is_empty() {
        prompt.push_str("\nBackground from web research:\n");
        for note in &ctx.research_notes {
            prompt.push_str(&format!("- {}\n", note));
        }
    }

    prompt.push_str(&format!(
        "\nReturn a JSON object: {{\"title\": string, \"description\": string}}. {}",
        JSON_ONLY
    ));

    prompt
}

/// Monthly-goal generation, one call for the whole run
pub fn monthly_prompt(ctx: &GenerationContext) -> String {
    let mut prompt = format!(
        "Plan the monthly goals for \"{}\" ({}).\n\
         The plan spans exactly {} months. Produce one goal per month, \
         ordered, building on each other.\n",
        ctx.title.as_str(),
        ctx.topic,
        ctx.duration_months
    );

    if let Some(context) = &ctx.interview_context {
        prompt.push_str(&format!("\nLearner context:\n{}\n", context));
    }

    prompt.push_str(&format!(
        "\nReturn a JSON array of exactly {} monthly goals: \
         [{{\"title\": string, \"description\": string}}, ...]. {}",
        ctx.duration_months, JSON_ONLY
    ));

    prompt
}

/// Weekly-task generation for one month
pub fn weekly_prompt(ctx: &GenerationContext, month_number: u32, month_title: &str) -> String {
    format!(
        "Break month {} (\"{}\") of the study plan about \"{}\" into weekly tasks.\n\
         Return a JSON array of exactly 4 weekly tasks: \
         [{{\"title\": string, \"description\": string}}, ...]. {}",
        month_number, month_title, ctx.topic, JSON_ONLY
    )
}

/// Daily-task generation for one week
pub fn daily_prompt(
    ctx: &GenerationContext,
    month_number: u32,
    week_number: u32,
    week_title: &str,
) -> String {
    let mut prompt = format!(
        "Break week {} of month {} (\"{}\") of the study plan about \"{}\" into daily tasks.\n",
        week_number, month_number, week_title, ctx.topic
    );

    if let Some(schedule) = &ctx.schedule {
        prompt.push_str(&format!(
            "The learner studies about {} minutes per day at {} intensity.\n",
            schedule.daily_minutes,
            schedule.intensity.as_str()
        ));
    }

    prompt.push_str(&format!(
        "Return a JSON array of exactly 7 daily tasks: \
         [{{\"title\": string, \"description\": string}}, ...]. {}",
        JSON_ONLY
    ));

    prompt
}

/// Per-answer quality evaluation
pub fn evaluation_prompt(topic: &str, question: &str, answer: &str) -> String {
    format!(
        "Score the answer a learner gave while being interviewed about their \
         \"{}\" study goals.\n\nQuestion: {}\nAnswer: {}\n\n\
         Return a JSON object with scores in [0,1]: \
         {{\"specificity\": number, \"relevance\": number, \"completeness\": number, \
         \"insights\": string}}. {}",
        topic, question, answer, JSON_ONLY
    )
}

/// Follow-up question for a weak answer
pub fn followup_prompt(question: &str, answer: &str) -> String {
    format!(
        "A learner gave a vague answer during an intake interview.\n\n\
         Question: {}\nAnswer: {}\n\n\
         Write one short follow-up question that would draw out the missing \
         detail. Respond with the question text only.",
        question, answer
    )
}

/// Final context compilation from the full interview transcript
pub fn compile_prompt(session: &InterviewSession) -> String {
    let mut transcript = String::new();
    for round in &session.history {
        for record in &round.answers {
            transcript.push_str(&format!(
                "Q: {}\nA: {}\n",
                record.question.question, record.answer
            ));
        }
    }

    format!(
        "Synthesize the learner context from this intake interview about \
         \"{}\".\n\n{}\n\
         Return a JSON object: {{\"context\": string, \"key_insights\": [string], \
         \"schedule\": {{\"daily_minutes\": number, \"rest_days\": [number 0-6, 0=Monday], \
         \"intensity\": \"light\"|\"moderate\"|\"intense\"}}}}. {}",
        session.topic, transcript, JSON_ONLY
    )
}
