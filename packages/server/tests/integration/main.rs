mod auth;
mod backoffice;
mod pastilles;
mod quizzes;
