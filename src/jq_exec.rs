//! `--jq-expr` pre-processing: runs a jq filter over a policy payload before decoding.
use anyhow::{Context, Result, anyhow};
use jaq_core::{Compiler, Ctx, RcIter, compile::Undefined, load};
use jaq_json::Val;
use serde_json::Value;

/// Every output of `filter_src` applied to `input`, as JSON values.
pub fn apply_filter(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    for (index, item) in outputs.enumerate() {
        let val = item.map_err(|err| anyhow!("jq filter `{filter_src}` failed: {err:?}"))?;
        // Val renders as JSON text.
        let value = serde_json::from_str(&val.to_string())
            .with_context(|| format!("jq output {index} of `{filter_src}` is not valid JSON"))?;
        out.push(value);
    }
    tracing::debug!(filter = filter_src, outputs = out.len(), "applied jq filter");
    Ok(out)
}

fn format_parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> anyhow::Error {
    let mut s = String::new();
    for (file, err) in errs {
        s.push_str(&format!("parse error: {err:?} in `{}`\n", file.code));
    }
    anyhow!(s)
}

fn format_undefined_errors(errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>) -> anyhow::Error {
    let mut s = String::new();
    for (file, list) in errs {
        for (name, undef) in list {
            s.push_str(&format!("undefined `{name}`: {undef:?} in `{}`\n", file.code));
        }
    }
    anyhow!(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn selects_list_items() {
        let input = json!({"items": [{"id": "a"}, {"id": "b", "video": true}]});
        let out = apply_filter(".items[] | select(.video == true)", &input).unwrap();
        assert_eq!(out, vec![json!({"id": "b", "video": true})]);
    }

    #[test]
    fn rejects_bad_filters() {
        assert!(apply_filter(".items[", &json!({})).is_err());
        assert!(apply_filter("no_such_function", &json!({})).is_err());
    }
}
