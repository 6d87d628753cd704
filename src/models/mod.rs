mod homework;

pub use homework::{Homework, HomeworkStatus, StatusPage};
