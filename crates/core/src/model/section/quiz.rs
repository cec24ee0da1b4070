use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::quiz::evaluate;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz must offer at least one option")]
    NoOptions,

    #[error("quiz options cannot be blank")]
    BlankOption,

    #[error("duplicate quiz option `{0}`")]
    DuplicateOption(String),

    #[error("quiz must have at least one correct answer")]
    EmptyAnswerKey,

    #[error("correct answer `{0}` is not one of the options")]
    AnswerNotInOptions(String),

    #[error("no option at index {0}")]
    OptionOutOfRange(usize),
}

//
// ─── ANSWER KEY ────────────────────────────────────────────────────────────────
//

/// Correct answer of a quiz.
///
/// A scalar marks a single-answer quiz, a set marks a multi-answer quiz. Both
/// are checked by the same set comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Single(String),
    Multiple(BTreeSet<String>),
}

impl CorrectAnswer {
    #[must_use]
    pub fn is_multiple(&self) -> bool {
        matches!(self, CorrectAnswer::Multiple(_))
    }

    /// Answer key as a set of option labels.
    #[must_use]
    pub fn key(&self) -> BTreeSet<&str> {
        match self {
            CorrectAnswer::Single(answer) => BTreeSet::from([answer.as_str()]),
            CorrectAnswer::Multiple(answers) => answers.iter().map(String::as_str).collect(),
        }
    }

    fn contains(&self, option: &str) -> bool {
        match self {
            CorrectAnswer::Single(answer) => answer == option,
            CorrectAnswer::Multiple(answers) => answers.contains(option),
        }
    }
}

//
// ─── QUIZ PAYLOAD ──────────────────────────────────────────────────────────────
//

/// Payload of a quiz section.
///
/// Options are unique and non-blank, and every correct answer is one of the
/// options. All editing operations return a new value and keep these rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizData {
    question: String,
    options: Vec<String>,
    correct_answer: CorrectAnswer,
}

impl QuizData {
    /// Builds a validated quiz payload.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if options are empty, blank or duplicated, or if the
    /// answer key is empty or references an unknown option.
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: CorrectAnswer,
    ) -> Result<Self, QuizError> {
        let quiz = Self {
            question: question.into(),
            options,
            correct_answer,
        };
        quiz.validate()?;
        Ok(quiz)
    }

    /// Convenience constructor for a single-answer quiz.
    ///
    /// # Errors
    ///
    /// See [`QuizData::new`].
    pub fn single<I, S>(question: impl Into<String>, options: I, answer: &str) -> Result<Self, QuizError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            question,
            options.into_iter().map(Into::into).collect(),
            CorrectAnswer::Single(answer.to_owned()),
        )
    }

    /// Convenience constructor for a multi-answer quiz.
    ///
    /// # Errors
    ///
    /// See [`QuizData::new`].
    pub fn multiple<I, S>(
        question: impl Into<String>,
        options: I,
        answers: &[&str],
    ) -> Result<Self, QuizError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            question,
            options.into_iter().map(Into::into).collect(),
            CorrectAnswer::Multiple(answers.iter().map(|a| (*a).to_owned()).collect()),
        )
    }

    pub(crate) fn placeholder() -> Self {
        Self {
            question: String::new(),
            options: vec!["Option 1".to_owned(), "Option 2".to_owned()],
            correct_answer: CorrectAnswer::Single("Option 1".to_owned()),
        }
    }

    fn validate(&self) -> Result<(), QuizError> {
        if self.options.is_empty() {
            return Err(QuizError::NoOptions);
        }
        let mut seen = BTreeSet::new();
        for option in &self.options {
            if option.trim().is_empty() {
                return Err(QuizError::BlankOption);
            }
            if !seen.insert(option.as_str()) {
                return Err(QuizError::DuplicateOption(option.clone()));
            }
        }
        let key = self.correct_answer.key();
        if key.is_empty() {
            return Err(QuizError::EmptyAnswerKey);
        }
        if let Some(missing) = key.iter().find(|answer| !seen.contains(*answer)) {
            return Err(QuizError::AnswerNotInOptions((*missing).to_owned()));
        }
        Ok(())
    }

    // Accessors
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &CorrectAnswer {
        &self.correct_answer
    }

    #[must_use]
    pub fn is_multi_answer(&self) -> bool {
        self.correct_answer.is_multiple()
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    #[must_use]
    pub fn is_correct_option(&self, option: &str) -> bool {
        self.correct_answer.contains(option)
    }

    /// Checks a learner's selection against the answer key.
    #[must_use]
    pub fn check<'a, I>(&self, submitted: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        evaluate(submitted, self.correct_answer.key())
    }

    //
    // ─── EDITING ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn with_question(&self, question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..self.clone()
        }
    }

    /// Appends an option that is not part of the answer key.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::BlankOption` or `QuizError::DuplicateOption`.
    pub fn with_option_added(&self, option: impl Into<String>) -> Result<Self, QuizError> {
        let mut next = self.clone();
        next.options.push(option.into());
        next.validate()?;
        Ok(next)
    }

    /// Renames the option at `index`; the answer key follows the rename.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::OptionOutOfRange`, `QuizError::BlankOption` or
    /// `QuizError::DuplicateOption`.
    pub fn with_option_renamed(
        &self,
        index: usize,
        option: impl Into<String>,
    ) -> Result<Self, QuizError> {
        let old = self
            .options
            .get(index)
            .ok_or(QuizError::OptionOutOfRange(index))?
            .clone();
        let option = option.into();
        let mut next = self.clone();
        next.options[index].clone_from(&option);
        next.correct_answer = match &self.correct_answer {
            CorrectAnswer::Single(answer) if *answer == old => CorrectAnswer::Single(option),
            CorrectAnswer::Multiple(answers) if answers.contains(&old) => {
                let mut answers = answers.clone();
                answers.remove(&old);
                answers.insert(option);
                CorrectAnswer::Multiple(answers)
            }
            other => other.clone(),
        };
        next.validate()?;
        Ok(next)
    }

    /// Removes the option at `index`, dropping it from the answer key too.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::OptionOutOfRange`, or `QuizError::EmptyAnswerKey`
    /// when the removed option was the last correct one.
    pub fn with_option_removed(&self, index: usize) -> Result<Self, QuizError> {
        if index >= self.options.len() {
            return Err(QuizError::OptionOutOfRange(index));
        }
        let mut next = self.clone();
        let removed = next.options.remove(index);
        next.correct_answer = match &self.correct_answer {
            CorrectAnswer::Single(answer) if *answer == removed => {
                return Err(QuizError::EmptyAnswerKey);
            }
            CorrectAnswer::Multiple(answers) => {
                let mut answers = answers.clone();
                answers.remove(&removed);
                CorrectAnswer::Multiple(answers)
            }
            other => other.clone(),
        };
        next.validate()?;
        Ok(next)
    }

    /// Marks or unmarks the option at `index` as correct.
    ///
    /// Single-answer quizzes move their answer to this option; multi-answer
    /// quizzes toggle membership.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::OptionOutOfRange`, or `QuizError::EmptyAnswerKey`
    /// when unmarking the last correct option.
    pub fn with_correct_toggled(&self, index: usize) -> Result<Self, QuizError> {
        let option = self
            .options
            .get(index)
            .ok_or(QuizError::OptionOutOfRange(index))?
            .clone();
        let mut next = self.clone();
        next.correct_answer = match &self.correct_answer {
            CorrectAnswer::Single(_) => CorrectAnswer::Single(option),
            CorrectAnswer::Multiple(answers) => {
                let mut answers = answers.clone();
                if !answers.remove(&option) {
                    answers.insert(option);
                }
                CorrectAnswer::Multiple(answers)
            }
        };
        next.validate()?;
        Ok(next)
    }

    /// Switches between single- and multi-answer mode.
    ///
    /// Narrowing to a single answer keeps the first correct option in option order.
    #[must_use]
    pub fn with_multi_answer(&self, multi: bool) -> Self {
        let correct_answer = match (&self.correct_answer, multi) {
            (CorrectAnswer::Single(answer), true) => {
                CorrectAnswer::Multiple(BTreeSet::from([answer.clone()]))
            }
            (CorrectAnswer::Multiple(answers), false) => {
                let first = self
                    .options
                    .iter()
                    .find(|o| answers.contains(*o))
                    .cloned()
                    .unwrap_or_default();
                CorrectAnswer::Single(first)
            }
            (same, _) => same.clone(),
        };
        Self {
            correct_answer,
            ..self.clone()
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
