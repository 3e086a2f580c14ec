use std::time::Duration;

/// Returns a formatted string of a duration, e.g.
/// `1min 34.852s`
pub fn get_formatted_elapsed_time(dur: Duration) -> String {
    let minutes = dur.as_secs() / 60;
    let sub_sec = dur.as_secs() % 60;
    let sub_milli = dur.subsec_millis();
    if minutes > 0 {
        return format!("{}min {}.{:03}s", minutes, sub_sec, sub_milli);
    }
    format!("{}.{:03}s", sub_sec, sub_milli)
}

/// Greedily wraps `val` to lines of at most `width` characters. Paragraphs
/// (separated by a blank line) are preserved.
pub fn wrapped_text(val: &str, width: usize) -> String {
    let paragraphs: Vec<&str> = val.split("\n\n").collect();
    let mut ret = String::new();
    for (i, paragraph) in paragraphs.iter().enumerate() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
            } else if line.len() + word.len() + 1 <= width {
                line.push(' ');
                line.push_str(word);
            } else {
                ret.push_str(&line);
                ret.push('\n');
                line = word.to_string();
            }
        }
        ret.push_str(&line);
        if i < paragraphs.len() - 1 {
            ret.push_str("\n\n");
        }
    }
    ret
}
