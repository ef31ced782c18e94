use url::Url;

/// File extensions that are never worth fetching as pages
pub const IGNORED_EXTENSIONS: &[&str] = &[
    // images
    "mng", "pct", "bmp", "gif", "jpg", "jpeg", "png", "pst", "psp", "tif", "tiff", "ai", "drw",
    "dxf", "eps", "ps", "svg",
    // audio
    "mp3", "wma", "ogg", "wav", "ra", "aac", "mid", "au", "aiff",
    // video
    "3gp", "asf", "asx", "avi", "mov", "mp4", "mpg", "qt", "rm", "swf", "wmv", "m4a",
    // other
    "css", "pdf", "doc", "docx", "xls", "xlsx", "dmg", "exe", "bin", "rss", "zip", "rar",
];

/// Returns true if the URL path ends in one of [`IGNORED_EXTENSIONS`]
///
/// Only the path is inspected, case-insensitively. The extension is the text
/// after the last `.` of the last path segment, so `/reports/2021.PDF` is
/// ignored while `/tips` and `/pdf/` are not.
pub fn has_ignored_extension(url: &Url) -> bool {
    let segment = url.path().rsplit('/').next().unwrap_or_default();

    match segment.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            IGNORED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}
