//! Fixed question banks presented at each interview stage.

use serde::{Deserialize, Serialize};

use super::session::InterviewStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    SingleChoice,
    MultiChoice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Question {
    pub fn text(id: &str, question: String, placeholder: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            question,
            question_type: QuestionType::Text,
            options: None,
            placeholder: placeholder.map(str::to_string),
        }
    }

    pub fn single_choice(id: &str, question: String, options: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            question,
            question_type: QuestionType::SingleChoice,
            options: Some(options.iter().map(|o| o.to_string()).collect()),
            placeholder: None,
        }
    }

    pub fn multi_choice(id: &str, question: String, options: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            question,
            question_type: QuestionType::MultiChoice,
            options: Some(options.iter().map(|o| o.to_string()).collect()),
            placeholder: None,
        }
    }
}

/// The question set opening each stage; follow-ups are generated per answer
pub fn bank_for_stage(stage: InterviewStage, topic: &str) -> Vec<Question> {
    match stage {
        InterviewStage::Stage1 => vec![
            Question::text(
                "s1q1",
                format!(
                    "What would you like to be able to do with {} once you finish?",
                    topic
                ),
                Some("e.g. build a small web service on my own"),
            ),
            Question::text(
                "s1q2",
                format!("What experience do you already have with {}?", topic),
                Some("courses, projects, work experience..."),
            ),
            Question::single_choice(
                "s1q3",
                "How deep do you want to go?".to_string(),
                &["Solid foundations", "Job-ready skills", "Expert depth"],
            ),
        ],
        InterviewStage::Stage2 => vec![
            Question::single_choice(
                "s2q1",
                "How do you learn best?".to_string(),
                &["Reading", "Video courses", "Hands-on projects", "A mix"],
            ),
            Question::multi_choice(
                "s2q2",
                "Which kinds of resources should the plan lean on?".to_string(),
                &["Books", "Online courses", "Documentation", "Exercises", "Projects"],
            ),
            Question::text(
                "s2q3",
                format!(
                    "What has gotten in the way when you tried to learn {} (or similar) before?",
                    topic
                ),
                None,
            ),
        ],
        InterviewStage::Stage3 => vec![
            Question::text(
                "s3q1",
                "How much time can you give this on a typical day?".to_string(),
                Some("e.g. 45 minutes in the evening"),
            ),
            Question::multi_choice(
                "s3q2",
                "Which days should stay free of study?".to_string(),
                &[
                    "Monday",
                    "Tuesday",
                    "Wednesday",
                    "Thursday",
                    "Friday",
                    "Saturday",
                    "Sunday",
                ],
            ),
            Question::single_choice(
                "s3q3",
                "What pace suits you?".to_string(),
                &["Light", "Moderate", "Intense"],
            ),
        ],
        // Terminal states present no questions
        InterviewStage::Completed | InterviewStage::Terminated => Vec::new(),
    }
}
