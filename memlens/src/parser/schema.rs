//! Table schemas for the built-in analysis commands.

/// Describes the tabular layout of one command's output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    /// Command name this schema applies to.
    pub command: String,
    /// Fixed number of leading header lines to drop before parsing.
    pub header_lines: usize,
    /// Expected column names, in output order. The final column absorbs any
    /// extra tokens, so free-text fields (paths, command lines) belong last.
    pub columns: Vec<String>,
}

impl TableSchema {
    /// Creates a schema from static column names.
    pub fn new(command: impl Into<String>, header_lines: usize, columns: &[&str]) -> Self {
        Self {
            command: command.into(),
            header_lines,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Process-listing columns shared by `windows.pslist` and `windows.psscan`.
const PROCESS_COLUMNS: &[&str] = &[
    "PID",
    "PPID",
    "ImageFileName",
    "Offset",
    "Threads",
    "Handles",
    "SessionId",
    "Wow64",
    "CreateTime",
    "ExitTime",
    "FileOutput",
];

/// Returns the schemas for the built-in command set.
///
/// Header-line counts cover the tool's banner plus the column header row.
pub fn builtin_schemas() -> Vec<TableSchema> {
    vec![
        TableSchema::new("windows.pslist", 4, PROCESS_COLUMNS),
        TableSchema::new("windows.psscan", 4, PROCESS_COLUMNS),
        TableSchema::new(
            "windows.netscan",
            4,
            &[
                "Offset", "Proto", "LocalAddr", "LocalPort", "ForeignAddr", "ForeignPort",
                "State", "PID", "Owner", "Created",
            ],
        ),
        TableSchema::new(
            "windows.dlllist",
            4,
            &["PID", "Process", "Base", "Size", "Name", "Path"],
        ),
        TableSchema::new("windows.cmdline", 4, &["PID", "Process", "Args"]),
        TableSchema::new(
            "windows.malfind",
            4,
            &[
                "PID", "Process", "StartVPN", "EndVPN", "Tag", "Protection", "CommitCharge",
                "PrivateMemory", "FileOutput", "Notes",
            ],
        ),
        TableSchema::new(
            "windows.handles",
            4,
            &["PID", "Process", "Offset", "HandleValue", "Type", "GrantedAccess", "Name"],
        ),
        TableSchema::new(
            "windows.filescan",
            4,
            &["Offset", "Name", "Size"],
        ),
    ]
}
