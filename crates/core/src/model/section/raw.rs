use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::data::{SectionData, SectionKind, TextData};
use super::error::{MalformedReason, MalformedSectionError};
use super::flashcards::{CardPair, FlashcardsData};
use super::quiz::{CorrectAnswer, QuizData};
use super::section::Section;
use crate::model::ids::{CardPairId, SectionId};

/// Section exactly as the store hands it over, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSection {
    pub id: String,
    pub title: String,
    pub order_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

impl RawSection {
    /// Validates the record against its declared variant.
    ///
    /// # Errors
    ///
    /// Returns `MalformedSectionError` naming this record's id and the first
    /// missing or invalid field. Nothing is coerced.
    pub fn parse(&self) -> Result<Section, MalformedSectionError> {
        let fail = |reason: MalformedReason| MalformedSectionError::new(self.id.clone(), reason);

        let id = self
            .id
            .parse::<SectionId>()
            .map_err(|_| fail(MalformedReason::InvalidId))?;
        let order_id = u32::try_from(self.order_id).map_err(|_| {
            fail(MalformedReason::InvalidField {
                field: "order_id".into(),
                expected: "a non-negative integer",
            })
        })?;
        let kind = self.kind.parse::<SectionKind>().map_err(fail)?;
        let data = parse_data(kind, &self.data).map_err(fail)?;

        Ok(Section::from_parts(id, self.title.clone(), order_id, data))
    }
}

fn parse_data(kind: SectionKind, data: &Value) -> Result<SectionData, MalformedReason> {
    let obj = data.as_object().ok_or_else(|| MalformedReason::InvalidField {
        field: "data".into(),
        expected: "an object",
    })?;

    match kind {
        SectionKind::Text => Ok(SectionData::Text(TextData::new(required_str(obj, "content")?))),
        SectionKind::Quiz => {
            let question = required_str(obj, "question")?;
            let options = string_array(required(obj, "options")?, "options")?;
            let correct = match required(obj, "correctAnswer")? {
                Value::String(answer) => CorrectAnswer::Single(answer.clone()),
                value @ Value::Array(_) => CorrectAnswer::Multiple(
                    string_array(value, "correctAnswer")?
                        .into_iter()
                        .collect::<BTreeSet<_>>(),
                ),
                _ => {
                    return Err(MalformedReason::InvalidField {
                        field: "correctAnswer".into(),
                        expected: "a string or an array of strings",
                    });
                }
            };
            Ok(SectionData::Quiz(QuizData::new(question, options, correct)?))
        }
        SectionKind::Flashcards => {
            let title = required_str(obj, "title")?;
            let Value::Array(items) = required(obj, "cardPairs")? else {
                return Err(MalformedReason::InvalidField {
                    field: "cardPairs".into(),
                    expected: "an array",
                });
            };
            let mut pairs = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                pairs.push(card_pair(item, index)?);
            }
            Ok(SectionData::Flashcards(FlashcardsData::new(title, pairs)?))
        }
    }
}

fn card_pair(item: &Value, index: usize) -> Result<CardPair, MalformedReason> {
    let field = |name: &str| format!("cardPairs[{index}].{name}");
    let obj = item.as_object().ok_or_else(|| MalformedReason::InvalidField {
        field: format!("cardPairs[{index}]"),
        expected: "an object",
    })?;
    let id = obj
        .get("id")
        .ok_or_else(|| MalformedReason::MissingField(field("id")))?
        .as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| MalformedReason::InvalidField {
            field: field("id"),
            expected: "a non-negative integer",
        })?;
    let text = |name: &str| -> Result<String, MalformedReason> {
        match obj.get(name) {
            None | Some(Value::Null) => Err(MalformedReason::MissingField(field(name))),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(MalformedReason::InvalidField {
                field: field(name),
                expected: "a string",
            }),
        }
    };
    Ok(CardPair::new(CardPairId::new(id), text("concept")?, text("details")?))
}

fn required<'a>(obj: &'a Map<String, Value>, name: &str) -> Result<&'a Value, MalformedReason> {
    match obj.get(name) {
        None | Some(Value::Null) => Err(MalformedReason::MissingField(name.to_owned())),
        Some(value) => Ok(value),
    }
}

fn required_str(obj: &Map<String, Value>, name: &str) -> Result<String, MalformedReason> {
    required(obj, name)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| MalformedReason::InvalidField {
            field: name.to_owned(),
            expected: "a string",
        })
}

fn string_array(value: &Value, name: &str) -> Result<Vec<String>, MalformedReason> {
    let invalid = || MalformedReason::InvalidField {
        field: name.to_owned(),
        expected: "an array of strings",
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(str::to_owned).ok_or_else(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::section::QuizError;
    use serde_json::json;

    fn raw(kind: &str, data: Value) -> RawSection {
        RawSection {
            id: SectionId::generate().to_string(),
            title: "Section".into(),
            order_id: 0,
            kind: kind.into(),
            data,
        }
    }

    #[test]
    fn parses_each_variant() {
        let text = raw("text", json!({ "content": "This is the introduction section." }))
            .parse()
            .unwrap();
        assert_eq!(text.kind(), SectionKind::Text);

        let quiz = raw(
            "quiz",
            json!({
                "question": "What is the capital of France?",
                "options": ["Paris", "London", "Berlin", "Madrid"],
                "correctAnswer": "Paris",
            }),
        )
        .parse()
        .unwrap();
        let data = quiz.data().as_quiz().unwrap();
        assert!(!data.is_multi_answer());
        assert!(data.check(["Paris"]));

        let cards = raw(
            "flashcards",
            json!({
                "title": "Sample Flashcards",
                "cardPairs": [
                    { "id": 1, "concept": "Concept 1", "details": "Details 1" },
                    { "id": 2, "concept": "Concept 2", "details": "Details 2" },
                ],
            }),
        )
        .parse()
        .unwrap();
        let SectionData::Flashcards(cards) = cards.data() else {
            panic!("expected flashcards");
        };
        assert_eq!(cards.card_pairs().len(), 2);
    }

    #[test]
    fn multi_answer_array_becomes_a_set() {
        let quiz = raw(
            "quiz",
            json!({
                "question": "Pick two",
                "options": ["efficiently", "scarcity", "wastewater"],
                "correctAnswer": ["scarcity", "efficiently"],
            }),
        )
        .parse()
        .unwrap();
        assert!(quiz.data().as_quiz().unwrap().is_multi_answer());
    }

    #[test]
    fn reports_unknown_type_with_section_id() {
        let record = raw("video", json!({}));
        let err = record.parse().unwrap_err();
        assert_eq!(err.section_id, record.id);
        assert_eq!(err.reason, MalformedReason::UnknownType("video".into()));
    }

    #[test]
    fn reports_missing_and_mistyped_fields() {
        let err = raw("text", json!({})).parse().unwrap_err();
        assert_eq!(err.reason, MalformedReason::MissingField("content".into()));

        let err = raw("quiz", json!({ "question": "Q", "options": "a,b", "correctAnswer": "a" }))
            .parse()
            .unwrap_err();
        assert!(matches!(
            err.reason,
            MalformedReason::InvalidField { ref field, .. } if field == "options"
        ));

        let err = raw(
            "flashcards",
            json!({ "title": "T", "cardPairs": [{ "id": 1, "concept": "c" }] }),
        )
        .parse()
        .unwrap_err();
        assert_eq!(
            err.reason,
            MalformedReason::MissingField("cardPairs[0].details".into())
        );
    }

    #[test]
    fn rejects_answers_missing_from_options() {
        let err = raw(
            "quiz",
            json!({ "question": "Q", "options": ["a", "b"], "correctAnswer": ["a", "c"] }),
        )
        .parse()
        .unwrap_err();
        assert_eq!(
            err.reason,
            MalformedReason::Quiz(QuizError::AnswerNotInOptions("c".into()))
        );
    }

    #[test]
    fn plain_string_ids_are_accepted() {
        let mut record = raw(
            "text",
            json!({ "content": "This is the introduction section." }),
        );
        record.id = "section1".into();
        let section = record.parse().unwrap();
        assert_eq!(section.id().as_str(), "section1");
        assert_eq!(section.to_raw().unwrap().id, "section1");
    }

    #[test]
    fn rejects_blank_ids_and_negative_order() {
        let mut record = raw("text", json!({ "content": "x" }));
        record.id = "  ".into();
        assert_eq!(record.parse().unwrap_err().reason, MalformedReason::InvalidId);

        let mut record = raw("text", json!({ "content": "x" }));
        record.order_id = -1;
        assert!(matches!(
            record.parse().unwrap_err().reason,
            MalformedReason::InvalidField { .. }
        ));
    }

    #[test]
    fn to_raw_and_back_preserves_the_section() {
        let section = Section::from_parts(
            SectionId::generate(),
            "Quiz",
            2,
            SectionData::Quiz(QuizData::multiple("Q", ["a", "b", "c"], &["a", "c"]).unwrap()),
        );
        let restored = section.to_raw().unwrap().parse().unwrap();
        assert_eq!(restored, section);
    }
}
