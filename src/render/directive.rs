//! Directive serialization into fluentd section syntax.

use crate::error::CompileError;
use crate::model::{ParamValue, Params, PluginDirective};

const INDENT: &str = "  ";

/// Indentation-tracking text sink for nested `<section>` blocks.
#[derive(Debug, Default)]
pub struct SectionWriter {
    out: String,
    depth: usize,
}

impl SectionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, name: &str, arg: Option<&str>) {
        self.indent();
        match arg {
            Some(arg) => self.out.push_str(&format!("<{} {}>\n", name, arg)),
            None => self.out.push_str(&format!("<{}>\n", name)),
        }
        self.depth += 1;
    }

    pub fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str(&format!("</{}>\n", name));
    }

    pub fn line(&mut self, key: &str, value: &str) {
        self.indent();
        self.out.push_str(key);
        if !value.is_empty() {
            self.out.push(' ');
            self.out.push_str(value);
        }
        self.out.push('\n');
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }
}

/// Write `directive` as a `<section arg>` block.
pub fn write_directive(
    w: &mut SectionWriter,
    section: &str,
    arg: Option<&str>,
    directive: &PluginDirective,
) -> Result<(), CompileError> {
    let context = directive.id.as_deref().unwrap_or(directive.kind.as_str());
    w.open(section, arg);
    w.line("@type", &directive.plugin_type());
    if let Some(id) = &directive.id {
        w.line("@id", id);
    }
    if directive.plugin_type() == "record_transformer" {
        let (params, record) = split_record(&directive.params);
        write_params(w, &params, context)?;
        if !record.is_empty() {
            write_section(w, "record", &record, context)?;
        }
    } else {
        write_params(w, &directive.params, context)?;
    }
    w.close(section);
    Ok(())
}

/// Pull `key`/`value` and `records` out of a record transformer's params
/// into one `<record>` body. An existing `record` section is the base.
fn split_record(params: &Params) -> (Params, Params) {
    let mut rest = params.clone();
    let mut record = match rest.remove("record") {
        Some(ParamValue::Section(section)) => section,
        Some(other) => {
            rest.insert("record".to_string(), other);
            Params::new()
        }
        None => Params::new(),
    };
    match rest.remove("records") {
        Some(ParamValue::Section(records)) => record.extend(records),
        Some(other) => {
            rest.insert("records".to_string(), other);
        }
        None => {}
    }
    if let (Some(ParamValue::Text(key)), Some(value)) = (rest.get("key").cloned(), rest.get("value").cloned()) {
        rest.remove("key");
        rest.remove("value");
        record.insert(key, value);
    }
    (rest, record)
}

fn write_params(w: &mut SectionWriter, params: &Params, context: &str) -> Result<(), CompileError> {
    for (key, value) in params {
        match value {
            ParamValue::Section(nested) => write_section(w, key, nested, context)?,
            ParamValue::List(items) if items.iter().any(|i| matches!(i, ParamValue::Section(_))) => {
                for item in items {
                    match item {
                        ParamValue::Section(nested) => write_section(w, key, nested, context)?,
                        _ => {
                            return Err(CompileError::RenderInvariant(format!(
                                "{}: list {:?} mixes sections and scalars",
                                context, key
                            )))
                        }
                    }
                }
            }
            ParamValue::List(items) if items.is_empty() => {}
            ParamValue::List(items) => {
                let rendered = items
                    .iter()
                    .map(|item| scalar(item, key, context))
                    .collect::<Result<Vec<_>, _>>()?;
                w.line(key, &rendered.join(","));
            }
            other => w.line(key, &scalar(other, key, context)?),
        }
    }
    Ok(())
}

fn write_section(w: &mut SectionWriter, name: &str, params: &Params, context: &str) -> Result<(), CompileError> {
    w.open(name, None);
    write_params(w, params, context)?;
    w.close(name);
    Ok(())
}

fn scalar(value: &ParamValue, key: &str, context: &str) -> Result<String, CompileError> {
    match value {
        ParamValue::Bool(b) => Ok(b.to_string()),
        ParamValue::Integer(i) => Ok(i.to_string()),
        ParamValue::Float(f) if f.is_finite() => Ok(f.to_string()),
        ParamValue::Float(f) => Err(CompileError::RenderInvariant(format!(
            "{}: parameter {:?} is not a finite number ({})",
            context, key, f
        ))),
        ParamValue::Text(s) => Ok(quote_if_needed(s)),
        ParamValue::Secret(_) => Err(CompileError::RenderInvariant(format!(
            "{}: parameter {:?} still references a secret",
            context, key
        ))),
        ParamValue::Section(_) | ParamValue::List(_) => Err(CompileError::RenderInvariant(format!(
            "{}: parameter {:?} nests a list inside a list",
            context, key
        ))),
    }
}

/// Empty or multi-line text is emitted as a double-quoted string.
fn quote_if_needed(s: &str) -> String {
    if s.is_empty() || s.contains('\n') || s.contains('\r') {
        serde_json::to_string(s).unwrap_or_else(|_| format!("{:?}", s))
    } else {
        s.to_string()
    }
}
