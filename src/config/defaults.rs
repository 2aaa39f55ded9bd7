pub(super) fn empty_string() -> String {
    String::new()
}

pub(super) fn empty_vec() -> Vec<String> {
    Vec::new()
}

pub(super) fn timeout_secs() -> u64 {
    5
}

pub(super) fn log_level() -> String {
    String::from("info")
}

pub(super) fn watch_interval() -> u32 {
    1000
}
