//! Internal constants for diagram rendering.

use std::time::Duration;

/// Default time a single diagram may take to render (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Line PlantUML writes between two diagrams in `-pipe` mode.
pub const PIPE_DELIMITER: &str = "___CLASSGRAPH_DIAGRAM_DELIMITER___";

/// PlantUML's URL alphabet (`0-9A-Za-z-_`).
pub const PLANTUML_ALPHABET: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// Raw DEFLATE level used for URL tokens (best compression).
pub const DEFLATE_LEVEL: u8 = 9;

/// Default PlantUML server for remote rendering.
pub const DEFAULT_SERVER_URL: &str = "https://www.plantuml.com/plantuml";
