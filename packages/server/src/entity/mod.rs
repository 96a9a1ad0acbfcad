pub mod pastille;
pub mod pastille_rating;
pub mod photo;
pub mod quiz;
pub mod quiz_answer;
pub mod user;
pub mod user_quiz_attempt;
pub mod zone;
