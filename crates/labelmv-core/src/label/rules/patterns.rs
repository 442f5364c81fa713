//! Regex patterns for slide label fields.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Sample number: two digits, hyphen, three digits at the start of the line
    pub static ref SAMPLE_ID: Regex = Regex::new(r"^[0-9]{2}-[0-9]{3}").unwrap();

    // Case number: NP- followed by digits, anywhere in the line
    pub static ref CASE_ID: Regex = Regex::new(r"NP-[0-9]+").unwrap();

    // Marker: the whole line is 3+ letters, digits or hyphens
    pub static ref MARKER_LINE: Regex = Regex::new(r"^[A-Za-z0-9-]{3,}$").unwrap();
}
