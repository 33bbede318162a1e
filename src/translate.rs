//! Ruby-to-Java translation
//!
//! `Translator` is the seam between the build core and whatever actually
//! turns a script into generated classes; the core only depends on the
//! contract: a pure function of `(source text, relative script path)` that
//! yields an ordered list of `OutputUnit`s or a failure with a message and
//! an optional line number. A host may plug in anything satisfying it, e.g.
//! an external jrubyc process.
//!
//! `ClassBindingTranslator` is the built-in implementation. It scans the
//! script's `module`/`class` structure and emits one Java class shell per
//! Ruby class. Each generated class carries a one-time bootstrap in its
//! static initializer: fetch or lazily create the shared Ruby runtime from
//! the application-scoped registry, evaluate the embedded script source,
//! resolve the Ruby class by name, and bind its metaclass. Load failures
//! name the original script path.

use std::sync::Arc;

use crate::models::OutputUnit;
use crate::registry::{RuntimeRegistry, RUBY_RUNTIME_KEY};

/// A failed translation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationFailure {
    pub message: String,
    /// 1-based line in the input script, when known
    pub line: Option<usize>,
}

impl TranslationFailure {
    pub fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
        }
    }
}

impl std::fmt::Display for TranslationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {})", self.message, line),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Source-to-source translator contract
///
/// Implementations must be pure: identical `(source, script_name)` inputs
/// produce byte-identical output units, so re-running a build over an
/// unchanged script is a no-op at the content level.
pub trait Translator {
    /// Translate one script into zero or more generated class definitions.
    ///
    /// `script_name` is the source-root-relative path of the script with
    /// forward slashes (e.g. `pkg/thing.rb`); it is embedded unmodified in
    /// generated bootstrap code.
    fn translate(
        &self,
        source: &str,
        script_name: &str,
    ) -> Result<Vec<OutputUnit>, TranslationFailure>;
}

/// Built-in translator generating Ruby-backed Java class shells
pub struct ClassBindingTranslator {
    registry: Arc<RuntimeRegistry>,
    runtime_key: String,
}

impl ClassBindingTranslator {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(RuntimeRegistry::new()))
    }

    /// Use a shared registry, so the bootstrap preamble and its runtime key
    /// are common with other application-scoped services of the host.
    pub fn with_registry(registry: Arc<RuntimeRegistry>) -> Self {
        Self {
            registry,
            runtime_key: RUBY_RUNTIME_KEY.to_string(),
        }
    }

    /// Runtime-acquisition preamble shared by every generated class.
    ///
    /// Built once per runtime key and cached in the registry; the text is a
    /// pure function of the key, so caching does not affect translator
    /// purity.
    fn preamble(&self) -> Arc<String> {
        let key = self.runtime_key.clone();
        self.registry
            .get_or_init(&self.runtime_key, move || build_preamble(&key))
    }
}

impl Default for ClassBindingTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for ClassBindingTranslator {
    fn translate(
        &self,
        source: &str,
        script_name: &str,
    ) -> Result<Vec<OutputUnit>, TranslationFailure> {
        let classes = scan_classes(source)?;
        let preamble = self.preamble();

        Ok(classes
            .iter()
            .map(|decl| generate_class(decl, source, script_name, &preamble))
            .collect())
    }
}

/// One Ruby class declaration found in the script
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassDecl {
    /// Full constant path, enclosing modules included (e.g. `["Pkg", "A"]`)
    segments: Vec<String>,
    /// 1-based line of the `class` keyword
    line: usize,
}

impl ClassDecl {
    fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Java package: enclosing constant path, lowercased and dotted.
    fn package(&self) -> String {
        self.segments[..self.segments.len() - 1]
            .iter()
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Ruby constant path (e.g. `Pkg::A`), used to resolve the class at
    /// load time.
    fn ruby_name(&self) -> String {
        self.segments.join("::")
    }

    fn qualified_name(&self) -> String {
        let package = self.package();
        if package.is_empty() {
            self.name().to_string()
        } else {
            format!("{}.{}", package, self.name())
        }
    }
}

/// Block-opening keywords that consume a matching `end`
const BLOCK_OPENERS: &[&str] = &[
    "def", "if", "unless", "case", "while", "until", "begin", "for",
];

/// One open `module`/`class`/block during the scan
#[derive(Debug)]
struct Frame {
    /// Constant segments this frame contributes to nesting (empty for
    /// plain blocks)
    segments: Vec<String>,
    line: usize,
}

/// Scan a script for class declarations by tracking `module`/`class`/`end`
/// nesting.
///
/// This intentionally reads structure only; the script body is carried into
/// the generated class verbatim and evaluated by the runtime at load time.
/// Structural keywords are recognized when a line starts with one; the rest
/// of such a line is then walked token by token, so one-line forms like
/// `class A; end` and `if x then y end` balance. A keyword inside a string
/// literal on a structural line can still miscount; bodies on their own
/// lines never can.
fn scan_classes(source: &str) -> Result<Vec<ClassDecl>, TranslationFailure> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut classes = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ';')
            .filter(|t| !t.is_empty())
            .collect();
        let first = tokens.first().copied().unwrap_or("");

        if first == "module"
            || first == "class"
            || first == "end"
            || BLOCK_OPENERS.contains(&first)
        {
            scan_line_tokens(&tokens, line_no, &mut stack, &mut classes)?;
        } else if ends_with_block_do(line) {
            // `... do` / `... do |args|` opens an iterator block
            stack.push(Frame {
                segments: Vec::new(),
                line: line_no,
            });
        }
    }

    if let Some(frame) = stack.last() {
        return Err(TranslationFailure::at(
            frame.line,
            format!("missing 'end' for block opened on line {}", frame.line),
        ));
    }

    Ok(classes)
}

/// Walk the tokens of a structural line, pushing and popping frames.
fn scan_line_tokens(
    tokens: &[&str],
    line_no: usize,
    stack: &mut Vec<Frame>,
    classes: &mut Vec<ClassDecl>,
) -> Result<(), TranslationFailure> {
    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i];
        if tok.starts_with('#') {
            break;
        }
        match tok {
            "module" | "class" => {
                let name = tokens.get(i + 1).copied().ok_or_else(|| {
                    TranslationFailure::at(line_no, format!("{tok} name expected after '{tok}'"))
                })?;
                i += 2;
                if tok == "class" && name == "<<" {
                    // Singleton class body: plain block, no generated unit
                    stack.push(Frame {
                        segments: Vec::new(),
                        line: line_no,
                    });
                    continue;
                }
                let own = parse_const_path(name, line_no)?;
                if tok == "class" {
                    let mut segments: Vec<String> = stack
                        .iter()
                        .flat_map(|f| f.segments.iter().cloned())
                        .collect();
                    segments.extend(own.iter().cloned());
                    classes.push(ClassDecl {
                        segments,
                        line: line_no,
                    });
                }
                stack.push(Frame {
                    segments: own,
                    line: line_no,
                });
                continue;
            }
            "end" => {
                if stack.pop().is_none() {
                    return Err(TranslationFailure::at(line_no, "unexpected 'end'"));
                }
            }
            _ if BLOCK_OPENERS.contains(&tok) => {
                stack.push(Frame {
                    segments: Vec::new(),
                    line: line_no,
                });
            }
            _ => {}
        }
        i += 1;
    }
    Ok(())
}

/// Does the line end in a `do` block opener (`... do` or `... do |x|`)?
fn ends_with_block_do(line: &str) -> bool {
    let line = line.trim_end();
    if line.ends_with(" do") || line == "do" {
        return true;
    }
    if let Some(pipe) = line.rfind(" do |") {
        return line[pipe..].ends_with('|');
    }
    false
}

/// Split and validate a Ruby constant path like `Pkg::Thing`.
fn parse_const_path(token: &str, line: usize) -> Result<Vec<String>, TranslationFailure> {
    // Strip a superclass clause glued to the name (`class A<Base`)
    let token = token.split('<').next().unwrap_or(token);
    let token = token.trim_end_matches(';');
    if token.is_empty() {
        return Err(TranslationFailure::at(line, "constant name expected"));
    }

    let mut segments = Vec::new();
    for segment in token.split("::") {
        let mut chars = segment.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_uppercase() => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if !valid {
            return Err(TranslationFailure::at(
                line,
                format!("'{token}' is not a valid constant name"),
            ));
        }
        segments.push(segment.to_string());
    }
    Ok(segments)
}

/// Runtime acquisition block keyed into the application scope.
fn build_preamble(runtime_key: &str) -> String {
    format!(
        r#"        java.util.Map<String, Object> applicationScope =
                javax.faces.context.FacesContext.getCurrentInstance().getExternalContext().getApplicationMap();
        if (applicationScope.containsKey("{key}")) {{
            __ruby__ = (Ruby) applicationScope.get("{key}");
        }} else {{
            RubyInstanceConfig config = Ruby.getGlobalRuntime().getInstanceConfig();
            config.setLoader(javax.faces.context.FacesContext.getCurrentInstance().getContextClassLoader());
            __ruby__ = Ruby.newInstance(config);
            applicationScope.put("{key}", __ruby__);
        }}"#,
        key = runtime_key
    )
}

/// Render one generated Java class.
fn generate_class(
    decl: &ClassDecl,
    source: &str,
    script_name: &str,
    preamble: &str,
) -> OutputUnit {
    let name = decl.name();
    let package = decl.package();
    let ruby_name = decl.ruby_name();
    let source_literal = java_string_literal(source);

    let package_line = if package.is_empty() {
        String::new()
    } else {
        format!("package {package};\n\n")
    };

    let java = format!(
        r#"{package_line}import org.jruby.Ruby;
import org.jruby.RubyClass;
import org.jruby.RubyInstanceConfig;
import org.jruby.RubyObject;
import org.jruby.runtime.builtin.IRubyObject;

public class {name} extends RubyObject {{
    private static final Ruby __ruby__;
    private static final RubyClass __metaclass__;

    static {{
{preamble}

        String source = new StringBuilder({source_literal}).toString();
        __ruby__.executeScript(source, "{script_name}");
        RubyClass metaclass = __ruby__.getClass("{ruby_name}");
        if (metaclass == null) {{
            throw new NoClassDefFoundError("Could not load Ruby class: {ruby_name} ({script_name})");
        }}
        metaclass.setRubyStaticAllocator({name}.class);
        __metaclass__ = metaclass;
    }}

    private {name}(Ruby runtime, RubyClass metaclass) {{
        super(runtime, metaclass);
    }}

    public static IRubyObject __allocate__(Ruby runtime, RubyClass metaclass) {{
        return new {name}(runtime, metaclass);
    }}
}}
"#
    );

    OutputUnit::new(decl.qualified_name(), package, java)
}

/// Quote arbitrary text as a multi-line Java string literal expression.
fn java_string_literal(text: &str) -> String {
    let mut lines: Vec<String> = text
        .lines()
        .map(|line| {
            let escaped = line.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\\n\"")
        })
        .collect();
    if lines.is_empty() {
        lines.push("\"\"".to_string());
    }
    lines.join(" +\n            ")
}
