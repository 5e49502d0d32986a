use gaze_select::SelectError;

pub const SUCCESS: i32 = 0;
/// Bad arguments, configuration or input files
pub const INPUT_ERROR: i32 = 1;
pub const EXECUTION_ERROR: i32 = 2;
/// Eye tracker unreachable or the feed failed
pub const TRANSPORT_ERROR: i32 = 3;

/// Exit code for a library error
pub fn for_error(error: &SelectError) -> i32 {
    match error {
        SelectError::InvalidConfig(_)
        | SelectError::UnknownMethod(_)
        | SelectError::UnknownFilter(_)
        | SelectError::Decode(_)
        | SelectError::Json(_) => INPUT_ERROR,
        SelectError::Transport(_) => TRANSPORT_ERROR,
        SelectError::IoError(_) => EXECUTION_ERROR,
    }
}
