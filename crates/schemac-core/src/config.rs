/// Controls how schemas are compiled and how compiled validators report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// When true, validation collects every violation instead of stopping at the first.
    pub all_errors: bool,
    /// When true, keywords that allow it accept `{"$data": "<pointer>"}` values.
    pub data: bool,
    /// When true, unknown keywords fail compilation instead of being logged and ignored.
    pub strict_keywords: bool,
    /// When true, unknown `format` names are ignored instead of failing compilation.
    pub ignore_unknown_formats: bool,
}
