use crate::db::models::CommentRow;

const ISSUE_OPEN: &str = "<issue>\n";
const ISSUE_CLOSE: &str = "</issue>\n";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    /// `<issue>` blocks emitted
    pub issues: usize,
    /// Author/body pairs emitted
    pub entries: usize,
}

/// Serialize rows already in transcript order (see
/// [`list_repo_rows`](crate::db::comments::list_repo_rows)).
///
/// Each issue's title row opens a new `<issue>` block. Comments whose issue
/// opening was never stored still get a block of their own when the issue
/// number changes. Rows without a body are skipped.
pub fn render_transcript(rows: &[CommentRow]) -> Transcript {
    let mut out = Transcript::default();
    let mut current_issue: Option<i64> = None;

    for row in rows {
        if row.is_base || current_issue != Some(row.issue_number) {
            if current_issue.is_some() {
                out.text.push_str(ISSUE_CLOSE);
            }
            out.text.push_str(ISSUE_OPEN);
            out.issues += 1;
            current_issue = Some(row.issue_number);
        }

        let Some(body) = &row.body else {
            continue;
        };

        out.text.push_str("<author>");
        out.text.push_str(&row.commenter);
        out.text.push_str("</author>\n");
        out.text.push_str(body);
        out.text.push('\n');
        out.entries += 1;
    }

    if current_issue.is_some() {
        out.text.push_str(ISSUE_CLOSE);
    }

    out
}
