//! Language selection and the lexer interface
//!
//! Every supported language is a variant of [`Language`], bound to one
//! static [`Lexer`]. Adding a language means adding a variant and a
//! module under `lang/`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::context::LineCtx;
use super::lang;
use super::state::BlockState;
use crate::error::{RelexError, Result};

/// A per-language line lexer
pub trait Lexer: Send + Sync {
    /// Classify one line and compute its exit state
    ///
    /// Reads `ctx.text` and `ctx.prev`, writes `ctx.formats` and
    /// `ctx.next`. Must not fail: malformed input gets `Format::Error`.
    fn lex(&self, ctx: &mut LineCtx<'_>);

    /// Whether a change of exit state can change how the next line lexes
    fn affects_next(&self, old: &BlockState, new: &BlockState) -> bool {
        old != new
    }
}

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cpp,
    Java,
    Go,
    Rust,
    Sh,
    Make,
    CMake,
    Python,
    Perl,
    Ruby,
    JavaScript,
    Qml,
    Php,
    Html,
    Css,
    Xml,
    Json,
    Yaml,
    Markdown,
    Rest,
    Lua,
    Pascal,
    Tcl,
    Latex,
    Fountain,
    Plain,
}

impl Language {
    /// Every language, in listing order
    pub const ALL: [Language; 27] = [
        Language::C,
        Language::Cpp,
        Language::Java,
        Language::Go,
        Language::Rust,
        Language::Sh,
        Language::Make,
        Language::CMake,
        Language::Python,
        Language::Perl,
        Language::Ruby,
        Language::JavaScript,
        Language::Qml,
        Language::Php,
        Language::Html,
        Language::Css,
        Language::Xml,
        Language::Json,
        Language::Yaml,
        Language::Markdown,
        Language::Rest,
        Language::Lua,
        Language::Pascal,
        Language::Tcl,
        Language::Latex,
        Language::Fountain,
        Language::Plain,
    ];

    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Sh => "sh",
            Language::Make => "make",
            Language::CMake => "cmake",
            Language::Python => "python",
            Language::Perl => "perl",
            Language::Ruby => "ruby",
            Language::JavaScript => "javascript",
            Language::Qml => "qml",
            Language::Php => "php",
            Language::Html => "html",
            Language::Css => "css",
            Language::Xml => "xml",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Markdown => "markdown",
            Language::Rest => "rest",
            Language::Lua => "lua",
            Language::Pascal => "pascal",
            Language::Tcl => "tcl",
            Language::Latex => "latex",
            Language::Fountain => "fountain",
            Language::Plain => "plain",
        }
    }

    /// Look up a language by name or common alias (case-insensitive)
    pub fn from_name(name: &str) -> Result<Language> {
        let lower = name.trim().to_ascii_lowercase();
        if let Some(lang) = Self::ALL.iter().find(|l| l.name() == lower) {
            return Ok(*lang);
        }
        let lang = match lower.as_str() {
            "h" | "objc" => Language::C,
            "c++" | "cxx" | "cc" | "hpp" => Language::Cpp,
            "golang" => Language::Go,
            "rs" => Language::Rust,
            "bash" | "shell" | "zsh" | "ksh" | "shell-script" => Language::Sh,
            "makefile" | "gmake" => Language::Make,
            "py" | "python3" => Language::Python,
            "pl" | "perl5" => Language::Perl,
            "rb" => Language::Ruby,
            "js" | "node" | "ecmascript" | "mjs" => Language::JavaScript,
            "htm" | "xhtml" => Language::Html,
            "svg" | "xsl" => Language::Xml,
            "yml" => Language::Yaml,
            "md" => Language::Markdown,
            "rst" | "restructuredtext" => Language::Rest,
            "delphi" | "pas" | "objectpascal" => Language::Pascal,
            "tex" => Language::Latex,
            "text" | "txt" | "none" => Language::Plain,
            _ => return Err(RelexError::UnknownLanguage(name.to_string())),
        };
        Ok(lang)
    }

    /// Language for a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Language> {
        let lang = match ext.to_ascii_lowercase().as_str() {
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "c++" | "hpp" | "hh" | "hxx" | "ipp" => Language::Cpp,
            "java" => Language::Java,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "sh" | "bash" | "zsh" | "ksh" => Language::Sh,
            "mk" | "mak" => Language::Make,
            "cmake" => Language::CMake,
            "py" | "pyw" | "pyi" => Language::Python,
            "pl" | "pm" | "t" | "pod" => Language::Perl,
            "rb" | "rake" | "gemspec" | "ru" => Language::Ruby,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "qml" => Language::Qml,
            "php" | "phtml" | "php3" | "php4" | "php5" => Language::Php,
            "html" | "htm" | "xhtml" => Language::Html,
            "css" => Language::Css,
            "xml" | "svg" | "xsl" | "xslt" | "ui" | "qrc" | "plist" => Language::Xml,
            "json" | "geojson" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "md" | "markdown" | "mkd" => Language::Markdown,
            "rst" | "rest" => Language::Rest,
            "lua" => Language::Lua,
            "pas" | "pp" | "dpr" | "lpr" | "inc" => Language::Pascal,
            "tcl" | "tk" => Language::Tcl,
            "tex" | "sty" | "cls" | "ltx" | "bib" => Language::Latex,
            "fountain" | "spmd" => Language::Fountain,
            "txt" | "text" => Language::Plain,
            _ => return None,
        };
        Some(lang)
    }

    /// Detect a language from a file path
    ///
    /// Well-known file names win over extensions.
    pub fn detect(path: &Path) -> Option<Language> {
        let file_name = path.file_name()?.to_str()?;
        let by_name = match file_name {
            "Makefile" | "makefile" | "GNUmakefile" => Some(Language::Make),
            "CMakeLists.txt" => Some(Language::CMake),
            ".bashrc" | ".bash_profile" | ".profile" | ".zshrc" | "PKGBUILD" | "APKBUILD" => {
                Some(Language::Sh)
            }
            "Rakefile" | "Gemfile" | "Vagrantfile" => Some(Language::Ruby),
            _ => None,
        };
        by_name.or_else(|| Self::from_extension(path.extension()?.to_str()?))
    }

    /// The lexer for this language
    pub fn lexer(self) -> &'static dyn Lexer {
        match self {
            Language::C => &lang::c::CFamily { cpp: false },
            Language::Cpp => &lang::c::CFamily { cpp: true },
            Language::Java => &lang::java::Java,
            Language::Go => &lang::go::Go,
            Language::Rust => &lang::rust::Rust,
            Language::Sh => &lang::shell::Shell,
            Language::Make => &lang::make::Make,
            Language::CMake => &lang::cmake::CMake,
            Language::Python => &lang::python::Python,
            Language::Perl => &lang::perl::Perl,
            Language::Ruby => &lang::ruby::Ruby,
            Language::JavaScript => &lang::javascript::JavaScript { qml: false },
            Language::Qml => &lang::javascript::JavaScript { qml: true },
            Language::Php => &lang::php::Php,
            Language::Html => &lang::html::Html,
            Language::Css => &lang::css::Css,
            Language::Xml => &lang::xml::Xml,
            Language::Json => &lang::json::Json,
            Language::Yaml => &lang::yaml::Yaml,
            Language::Markdown => &lang::markdown::Markdown,
            Language::Rest => &lang::rest::Rest,
            Language::Lua => &lang::lua::Lua,
            Language::Pascal => &lang::pascal::Pascal,
            Language::Tcl => &lang::tcl::Tcl,
            Language::Latex => &lang::latex::Latex,
            Language::Fountain => &lang::fountain::Fountain,
            Language::Plain => &lang::Plain,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = RelexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}
