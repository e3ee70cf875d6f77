// src/models/ids.rs

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Primary key of a row in `quizzes`.
    QuizId
);
id_type!(
    /// Primary key of a row in `questions`.
    QuestionId
);
id_type!(
    /// Primary key of a row in `options`.
    OptionId
);
id_type!(
    /// Primary key of a row in `quiz_attempts`.
    AttemptId
);
id_type!(
    /// Authenticated user identity, as carried in the JWT `sub` claim.
    UserId
);
