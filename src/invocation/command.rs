use super::{Invocation, InvocationContext};
use crate::error::AdapterError;
use crate::runner::CommandSpec;
use crate::shared::paths::resolve_against;
use std::path::Path;

/// A `{...}` placeholder inside a command template element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateToken {
    /// `{input:ROLE}`: path(s) bound to an input role.
    Input(String),
    /// `{output:ROLE}`: absolute preset path of a declared output.
    Output(String),
    /// `{arg:NAME}`: a configuration value.
    Arg(String),
    /// `{execution}`: the execution directory.
    Execution,
}

impl TemplateToken {
    pub fn parse(inner: &str) -> Option<Self> {
        if inner == "execution" {
            return Some(Self::Execution);
        }
        let (kind, name) = inner.split_once(':')?;
        if name.is_empty() {
            return None;
        }
        match kind {
            "input" => Some(Self::Input(name.to_string())),
            "output" => Some(Self::Output(name.to_string())),
            "arg" => Some(Self::Arg(name.to_string())),
            _ => None,
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Input(role) => format!("input:{role}"),
            Self::Output(role) => format!("output:{role}"),
            Self::Arg(name) => format!("arg:{name}"),
            Self::Execution => "execution".to_string(),
        }
    }
}

fn resolve_token(
    token: &TemplateToken,
    ctx: &InvocationContext<'_>,
) -> Result<Vec<String>, AdapterError> {
    let missing = || AdapterError::MissingArgument {
        tool: ctx.tool.to_string(),
        name: token.label(),
    };
    match token {
        TemplateToken::Input(role) => ctx
            .inputs
            .get(role)
            .map(|resolved| resolved.binding.paths())
            .ok_or_else(missing),
        TemplateToken::Output(role) => ctx
            .outputs
            .iter()
            .find(|output| &output.name == role)
            .and_then(|output| output.file_path.as_deref())
            .map(|path| {
                vec![resolve_against(ctx.execution_dir, Path::new(path))
                    .display()
                    .to_string()]
            })
            .ok_or_else(missing),
        TemplateToken::Arg(name) => ctx
            .configuration
            .get_str(name)
            .map(|value| vec![value])
            .ok_or_else(missing),
        TemplateToken::Execution => Ok(vec![ctx.execution_dir.display().to_string()]),
    }
}

fn expand_element(element: &str, ctx: &InvocationContext<'_>) -> Result<Vec<String>, AdapterError> {
    if let Some(token) = element
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .and_then(TemplateToken::parse)
    {
        return resolve_token(&token, ctx);
    }

    let mut expanded = String::with_capacity(element.len());
    let mut rest = element;
    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            expanded.push_str(&rest[open..]);
            rest = "";
            break;
        };
        match TemplateToken::parse(&after[..close]) {
            Some(token) => expanded.push_str(&resolve_token(&token, ctx)?.join(" ")),
            None => expanded.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    expanded.push_str(rest);
    Ok(vec![expanded])
}

/// Substitutes every placeholder in `template`.
///
/// An element that is exactly one placeholder expands to one argv entry per
/// bound value, so a multi-valued input role yields several entries. A
/// placeholder embedded in a longer element is replaced by its values joined
/// with spaces. Text in braces that is not a known placeholder is kept as is.
pub fn expand_command(
    template: &[String],
    ctx: &InvocationContext<'_>,
) -> Result<Vec<String>, AdapterError> {
    let mut argv = Vec::with_capacity(template.len());
    for element in template {
        argv.extend(expand_element(element, ctx)?);
    }
    Ok(argv)
}

/// Builds the shell adapter's command. With `binary` set, every template
/// element is an argument; otherwise the first expanded element is the
/// program.
pub fn build_shell_invocation(ctx: &InvocationContext<'_>) -> Result<Invocation, AdapterError> {
    let mut argv = expand_command(&ctx.settings.command, ctx)?.into_iter();
    let program = match ctx.settings.binary.as_deref() {
        Some(binary) => binary.to_string(),
        None => argv.next().ok_or_else(|| AdapterError::MissingArgument {
            tool: ctx.tool.to_string(),
            name: "command".to_string(),
        })?,
    };
    Ok(Invocation {
        command: CommandSpec::new(&program, ctx.execution_dir).args(argv),
        artifact: None,
    })
}
