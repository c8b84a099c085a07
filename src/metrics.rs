//! Prometheus counters for the server. Without the `prometheus` feature the functions in here do
//! nothing.

use crate::server::{
    controlchan::{Reply, ReplyCode, error::ControlChanErrorKind},
    datachan::TransferOutcome,
};

#[cfg(feature = "prometheus")]
mod counters {
    use lazy_static::lazy_static;
    use prometheus::{IntCounter, IntCounterVec, opts, register_int_counter, register_int_counter_vec};

    lazy_static! {
        pub static ref FTP_AUTH_FAILURES: IntCounter = register_int_counter!(opts!("ftp_auth_failures", "Total number of authentication failures.")).unwrap();
        pub static ref FTP_SESSIONS: IntCounter = register_int_counter!(opts!("ftp_sessions_total", "Total number of FTP sessions.")).unwrap();
        pub static ref FTP_BACKEND_WRITE_BYTES: IntCounter =
            register_int_counter!(opts!("ftp_backend_write_bytes", "Total number of bytes written to the backend.")).unwrap();
        pub static ref FTP_BACKEND_READ_BYTES: IntCounter =
            register_int_counter!(opts!("ftp_backend_read_bytes", "Total number of bytes retrieved from the backend.")).unwrap();
        pub static ref FTP_BACKEND_WRITE_FILES: IntCounter =
            register_int_counter!(opts!("ftp_backend_write_files", "Total number of files written to the backend.")).unwrap();
        pub static ref FTP_BACKEND_READ_FILES: IntCounter =
            register_int_counter!(opts!("ftp_backend_read_files", "Total number of files retrieved from the backend.")).unwrap();
        pub static ref FTP_COMMAND_TOTAL: IntCounterVec =
            register_int_counter_vec!("ftp_command_total", "Total number of commands received.", &["command"]).unwrap();
        pub static ref FTP_REPLY_TOTAL: IntCounterVec =
            register_int_counter_vec!("ftp_reply_total", "Total number of reply codes server sent to clients.", &["range"]).unwrap();
        pub static ref FTP_ERROR_TOTAL: IntCounterVec = register_int_counter_vec!("ftp_error_total", "Total number of errors encountered.", &["type"]).unwrap();
    }
}

/// Counts a new control connection.
pub(crate) fn inc_session() {
    #[cfg(feature = "prometheus")]
    counters::FTP_SESSIONS.inc();
}

/// Counts a failed `PASS`.
pub(crate) fn inc_failed_login() {
    #[cfg(feature = "prometheus")]
    counters::FTP_AUTH_FAILURES.inc();
}

/// Counts a received command by its verb.
pub(crate) fn add_command_metric(verb: &str) {
    #[cfg(feature = "prometheus")]
    counters::FTP_COMMAND_TOTAL.with_label_values(&[verb.to_lowercase()]).inc();
    #[cfg(not(feature = "prometheus"))]
    let _ = verb;
}

/// Counts an error that ended a command or a session, labelled by its kind.
pub(crate) fn add_error_metric(kind: ControlChanErrorKind) {
    #[cfg(feature = "prometheus")]
    counters::FTP_ERROR_TOTAL.with_label_values(&[kind.label()]).inc();
    #[cfg(not(feature = "prometheus"))]
    let _ = kind;
}

/// Counts the codes of a reply by class (`2xx`, `5xx`, ...).
pub(crate) fn add_reply_metric(reply: &Reply) {
    match reply {
        Reply::None => {}
        Reply::CodeAndMsg { code, .. } | Reply::MultiLine { code, .. } => add_replycode_metric(*code),
        Reply::Sequence(replies) => replies.iter().for_each(add_reply_metric),
    }
}

fn add_replycode_metric(code: ReplyCode) {
    let range = format!("{}xx", code as u32 / 100 % 10);
    #[cfg(feature = "prometheus")]
    counters::FTP_REPLY_TOTAL.with_label_values(&[range]).inc();
    #[cfg(not(feature = "prometheus"))]
    let _ = range;
}

/// Counts the files and bytes moved by a finished transfer.
pub(crate) fn add_transfer_metric(outcome: &TransferOutcome) {
    #[cfg(feature = "prometheus")]
    if let TransferOutcome::Completed { kind, bytes } = outcome {
        match *kind {
            "download" => {
                counters::FTP_BACKEND_READ_FILES.inc();
                counters::FTP_BACKEND_READ_BYTES.inc_by(*bytes);
            }
            "upload" => {
                counters::FTP_BACKEND_WRITE_FILES.inc();
                counters::FTP_BACKEND_WRITE_BYTES.inc_by(*bytes);
            }
            _ => {}
        }
    }
    #[cfg(not(feature = "prometheus"))]
    let _ = outcome;
}
