use notify_rust::{Notification, Timeout};

use crate::logger::log_line;

pub const APP_NAME: &str = "Media.Ext";

pub fn saved_body(file_name: &str) -> String {
    format!("File saved: {}", file_name)
}

/// Desktop notification after a successful save. Off the UI thread since
/// some backends block on the session bus.
pub fn notify_extraction_completed(file_name: &str) {
    let body = saved_body(file_name);
    std::thread::spawn(move || {
        let shown = Notification::new()
            .appname(APP_NAME)
            .summary("Extraction Completed")
            .body(&body)
            .timeout(Timeout::Milliseconds(5000))
            .show();
        if let Err(e) = shown {
            log_line(&format!("Notification failed: {}", e));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_names_the_file() {
        assert_eq!(saved_body("song.mp3"), "File saved: song.mp3");
    }
}
