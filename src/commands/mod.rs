/*!
 * Commands Module
 * Command template parsing and matching
 */

pub mod matcher;
pub mod template;

pub use matcher::{find_match, match_template, MatchedCommand};
pub use template::{CommandTemplate, TemplateList, Token, PATH_PLACEHOLDER};
