//! AT command builders and reply markers.
//!
//! All functions are pure: they produce the command text without the
//! terminator (the [`Modem`](crate::Modem) frames and sends it). Only the
//! text-mode subset needed to drive SMS traffic is covered; PDU mode is
//! not modeled.

/// Reply marker: the SIM is ready for traffic.
pub const SIM_READY: &str = "+CPIN: READY";

/// Reply marker: the SIM is waiting for its PIN code.
pub const SIM_PIN_REQUIRED: &str = "+CPIN: SIM PIN";

/// Build the communication check command (`AT`).
pub fn cmd_check() -> String {
    "AT".to_string()
}

/// Build the "submit SIM PIN" command (`AT+CPIN=<pin>`).
pub fn cmd_set_pin(pin: &str) -> String {
    format!("AT+CPIN={pin}")
}

/// Build the "select SMS text mode" command (`AT+CMGF=1`).
pub fn cmd_text_mode() -> String {
    "AT+CMGF=1".to_string()
}

/// Build the "set SMS service center" command (`AT+CSCA="<number>"`).
pub fn cmd_sms_center(center: &str) -> String {
    format!("AT+CSCA=\"{center}\"")
}

/// Build the "verbose error reports" command (`AT+CMEE=2`).
pub fn cmd_verbose_errors() -> String {
    "AT+CMEE=2".to_string()
}

/// Build the SIM state query (`AT+CPIN?`).
pub fn cmd_sim_state() -> String {
    "AT+CPIN?".to_string()
}

/// Build the signal quality query (`AT+CSQ`).
pub fn cmd_signal_quality() -> String {
    "AT+CSQ".to_string()
}

/// Build the "send SMS to" address frame (`AT+CMGS="<number>"`).
///
/// The modem answers with an input prompt; the message body and the
/// CTRL-Z terminator follow as separate writes.
pub fn cmd_send_sms_to(number: &str) -> String {
    format!("AT+CMGS=\"{number}\"")
}
