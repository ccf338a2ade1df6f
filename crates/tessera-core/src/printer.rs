//! Textual IR printing in MLIR generic form.
//!
//! Used for debug snapshots between pipeline stages. Values are numbered in
//! order of definition: arguments print as `%argN`, results as `%N`.

use crate::ir::{Function, Module, Operation, ValueDef, ValueId};
use crate::types::join;
use std::collections::HashMap;
use std::fmt::{self, Write};

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => writeln!(f, "module @{} {{", name)?,
            None => writeln!(f, "module {{")?,
        }
        for function in self.functions() {
            write_function(f, function, "  ")?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_function(f, self, "")
    }
}

fn write_function(f: &mut fmt::Formatter<'_>, function: &Function, indent: &str) -> fmt::Result {
    let names = value_names(function);
    let name = |id: &ValueId| {
        names
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("%<invalid {}>", id.index()))
    };

    let mut args = Vec::new();
    for id in function.arguments() {
        let ty = function.value_type(*id).map_err(|_| fmt::Error)?;
        args.push(format!("{}: {}", name(id), ty));
    }
    writeln!(
        f,
        "{indent}func.func @{}({}) -> ({}) {{",
        function.name(),
        args.join(", "),
        join(&function.signature().outputs)
    )?;

    for (_, op) in function.ops() {
        let mut line = String::new();
        if !op.results.is_empty() {
            let results: Vec<String> = op.results.iter().map(&name).collect();
            write!(line, "{} = ", results.join(", "))?;
        }
        let operands: Vec<String> = op.operands.iter().map(&name).collect();
        write!(line, "\"{}\"({})", op.name, operands.join(", "))?;
        write_attributes(&mut line, op)?;
        write!(
            line,
            " : ({}) -> {}",
            type_list(function, &op.operands),
            result_types(function, &op.results)
        )?;
        if let Some(loc) = &op.loc {
            write!(line, " loc({:?})", loc)?;
        }
        writeln!(f, "{indent}  {}", line)?;
    }

    writeln!(f, "{indent}}}")
}

fn write_attributes(out: &mut String, op: &Operation) -> fmt::Result {
    if op.attributes.is_empty() {
        return Ok(());
    }
    let mut keys: Vec<&String> = op.attributes.keys().collect();
    keys.sort();
    let items: Vec<String> = keys
        .into_iter()
        .map(|key| format!("{} = {}", key, op.attributes[key]))
        .collect();
    write!(out, " {{{}}}", items.join(", "))
}

fn type_list(function: &Function, values: &[ValueId]) -> String {
    values
        .iter()
        .map(|&id| match function.value_type(id) {
            Ok(ty) => ty.to_string(),
            Err(_) => "<invalid>".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn result_types(function: &Function, results: &[ValueId]) -> String {
    match results {
        [] => "()".to_string(),
        [single] => type_list(function, std::slice::from_ref(single)),
        many => format!("({})", type_list(function, many)),
    }
}

fn value_names(function: &Function) -> HashMap<ValueId, String> {
    let mut names = HashMap::new();
    for &id in function.arguments() {
        if let Ok(value) = function.value(id)
            && let ValueDef::Argument(index) = value.def
        {
            names.insert(id, format!("%arg{}", index));
        }
    }
    let mut next = 0;
    for (_, op) in function.ops() {
        for &result in &op.results {
            names.insert(result, format!("%{}", next));
            next += 1;
        }
    }
    names
}
