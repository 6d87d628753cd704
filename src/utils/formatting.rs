use indoc::formatdoc;

use crate::models::{Homework, HomeworkStatus};

/// Renders the notification text for a homework record. Total: an
/// unrecognized status gets its own fixed message instead of an error.
pub fn status_message(homework: &Homework) -> String {
    let name = &homework.homework_name;

    match homework.status() {
        HomeworkStatus::Reviewing => {
            format!(r#"Your work "{name}" has been taken into review."#)
        }

        HomeworkStatus::Rejected => formatdoc! {
            r#"
                Your work "{name}" has been reviewed!

                Unfortunately, the reviewer found some errors in it.
            "#,
        },

        HomeworkStatus::Approved => formatdoc! {
            r#"
                Your work "{name}" has been reviewed!

                The reviewer liked everything, the work has been accepted!
            "#,
        },

        HomeworkStatus::Unknown => {
            format!(r#"The status of your work "{name}" is not recognized."#)
        }
    }
}
