//! Loops, comprehensions, `grep` and `map`.
//!
//! Every body runs in a fresh child scope per iteration. The body result is
//! classified by [`flow`]: `Break` stops the loop, `Continue` moves to the
//! next iteration, and `Return` or an error propagates out of the loop.

use std::sync::Arc;

use magpie_ir::{Block, Comprehension, ComprehensionOutput, Expr, ForEach, Ident, Position, Stmt};

use super::Interpreter;
use crate::errors::{not_iterable, unhashable_key, ControlAction, EvalResult};
use crate::methods::len_to_value;
use crate::value::HashValue;
use crate::Value;

/// What a loop does after one body evaluation.
enum Flow {
    Next(Value),
    Skip,
    Stop,
}

fn flow(result: EvalResult) -> EvalResult<Flow> {
    match result {
        Ok(value) => Ok(Flow::Next(value)),
        Err(ControlAction::Continue) => Ok(Flow::Skip),
        Err(ControlAction::Break) => Ok(Flow::Stop),
        Err(other) => Err(other),
    }
}

/// Elements of an iterable value as `(key, element)` pairs.
///
/// The key is the position for sequences and the key for hashes. Arrays
/// and hashes are snapshotted, so the body may mutate them freely; ranges
/// and channels are consumed lazily.
pub(super) struct Elements {
    items: Box<dyn Iterator<Item = (Value, Value)>>,
    /// A lone loop variable binds the key rather than the element.
    binds_key: bool,
}

impl Elements {
    pub(super) fn of(value: &Value, pos: Position) -> EvalResult<Elements> {
        let indexed = |items: Vec<Value>| -> Box<dyn Iterator<Item = (Value, Value)>> {
            Box::new(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (len_to_value(i), item)),
            )
        };

        let (items, binds_key) = match value {
            Value::Array(items) => (indexed(items.snapshot()), false),
            Value::Tuple(t) => (indexed(t.items.to_vec()), false),
            Value::Str(s) if s.is_valid() => {
                let chars = s.raw().chars().map(|c| Value::string(c.to_string())).collect();
                (indexed(chars), false)
            }
            Value::Hash(h) => {
                let pairs: Vec<(Value, Value)> = h
                    .read()
                    .iter()
                    .map(|pair| (pair.key.clone(), pair.value.clone()))
                    .collect();
                (
                    Box::new(pairs.into_iter()) as Box<dyn Iterator<Item = (Value, Value)>>,
                    true,
                )
            }
            Value::Range(r) => {
                let iter = r
                    .iter()
                    .enumerate()
                    .map(|(i, n)| (len_to_value(i), Value::int(n)));
                (Box::new(iter) as Box<dyn Iterator<Item = (Value, Value)>>, false)
            }
            Value::Channel(ch) => {
                let ch = ch.clone();
                let iter = std::iter::from_fn(move || ch.recv())
                    .enumerate()
                    .map(|(i, item)| (len_to_value(i), item));
                (Box::new(iter) as Box<dyn Iterator<Item = (Value, Value)>>, false)
            }
            Value::Host(object) => match object.iterate() {
                Some(items) => (indexed(items), false),
                None => return Err(not_iterable(pos, value.kind()).into()),
            },
            other => return Err(not_iterable(pos, other.kind()).into()),
        };
        Ok(Elements { items, binds_key })
    }
}

impl Iterator for Elements {
    type Item = (Value, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}

impl Interpreter {
    /// Bind one element into the current scope, plus `$_` as its index.
    fn bind_element(
        &mut self,
        key_var: Option<&Ident>,
        value_var: &Ident,
        binds_key: bool,
        index: usize,
        (key, element): (Value, Value),
    ) {
        match key_var {
            Some(key_var) => {
                self.env.set(Arc::clone(&key_var.name), key);
                self.env.set(Arc::clone(&value_var.name), element);
            }
            None if binds_key => self.env.set(Arc::clone(&value_var.name), key),
            None => self.env.set(Arc::clone(&value_var.name), element),
        }
        self.env.set("$_", len_to_value(index));
    }

    fn passes(&mut self, filter: Option<&Expr>) -> EvalResult<bool> {
        match filter {
            Some(filter) => Ok(self.eval_expr(filter)?.is_truthy()),
            None => Ok(true),
        }
    }

    pub(super) fn eval_while(&mut self, cond: &Expr, body: &Block) -> EvalResult {
        while self.eval_expr(cond)?.is_truthy() {
            if let Flow::Stop = flow(self.eval_block_scoped(body))? {
                break;
            }
        }
        Ok(Value::nil())
    }

    /// `do { }` and `for { }`: run until `break`.
    pub(super) fn eval_forever(&mut self, body: &Block) -> EvalResult {
        loop {
            if let Flow::Stop = flow(self.eval_block_scoped(body))? {
                return Ok(Value::nil());
            }
        }
    }

    /// C-style `for (init; cond; update)`. The init binding is scoped to the
    /// loop; `continue` still runs the update.
    pub(super) fn eval_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &Block,
    ) -> EvalResult {
        self.with_child_scope(|interp| {
            if let Some(init) = init {
                interp.eval_stmt(init)?;
            }
            loop {
                if let Some(cond) = cond {
                    if !interp.eval_expr(cond)?.is_truthy() {
                        break;
                    }
                }
                if let Flow::Stop = flow(interp.eval_block_scoped(body))? {
                    break;
                }
                if let Some(update) = update {
                    interp.eval_expr(update)?;
                }
            }
            Ok(Value::nil())
        })
    }

    /// `for k, v in iterable where filter { body }`. Evaluates to the array
    /// of body results, including those collected before a `break`.
    pub(super) fn eval_for_each(&mut self, each: &ForEach, pos: Position) -> EvalResult {
        let iterable = self.eval_expr(&each.iterable)?;
        let elements = Elements::of(&iterable, pos)?;
        let binds_key = elements.binds_key;
        let mut results = Vec::new();

        for (index, element) in elements.enumerate() {
            let step = self.with_child_scope(|interp| -> EvalResult {
                interp.bind_element(each.key.as_ref(), &each.value, binds_key, index, element);
                if !interp.passes(each.filter.as_ref())? {
                    return Err(ControlAction::Continue);
                }
                interp.eval_block(&each.body)
            });
            match flow(step)? {
                Flow::Next(value) => results.push(value),
                Flow::Skip => {}
                Flow::Stop => break,
            }
        }
        Ok(Value::array(results))
    }

    /// `[out for x in iterable where filter]` and `{k => v for ...}`.
    pub(super) fn eval_comprehension(&mut self, comp: &Comprehension, pos: Position) -> EvalResult {
        let iterable = self.eval_expr(&comp.iterable)?;
        let elements = Elements::of(&iterable, pos)?;
        let binds_key = elements.binds_key;
        let mut array = Vec::new();
        let mut hash = HashValue::new();

        for (index, element) in elements.enumerate() {
            self.with_child_scope(|interp| -> EvalResult<()> {
                interp.bind_element(comp.key.as_ref(), &comp.value, binds_key, index, element);
                if !interp.passes(comp.filter.as_ref())? {
                    return Ok(());
                }
                match &comp.output {
                    ComprehensionOutput::Array(out) => array.push(interp.eval_expr(out)?),
                    ComprehensionOutput::Hash { key, value } => {
                        let k = interp.eval_expr(key)?;
                        let hash_key = k.hash_key().ok_or_else(|| unhashable_key(pos, k.kind()))?;
                        let v = interp.eval_expr(value)?;
                        hash.insert(hash_key, k, v);
                    }
                }
                Ok(())
            })?;
        }

        Ok(match comp.output {
            ComprehensionOutput::Array(_) => Value::array(array),
            ComprehensionOutput::Hash { .. } => Value::hash(hash),
        })
    }

    /// `grep x in items { cond }`: the elements for which `cond` is truthy.
    pub(super) fn eval_grep(&mut self, var: &str, iterable: &Expr, cond: &Expr, pos: Position) -> EvalResult {
        let var = Ident::new(var, pos);
        let source = self.eval_expr(iterable)?;
        let elements = Elements::of(&source, pos)?;
        let binds_key = elements.binds_key;
        let mut kept = Vec::new();

        for (index, element) in elements.enumerate() {
            let candidate = if binds_key { element.0.clone() } else { element.1.clone() };
            let keep = self.with_child_scope(|interp| -> EvalResult<bool> {
                interp.bind_element(None, &var, binds_key, index, element);
                Ok(interp.eval_expr(cond)?.is_truthy())
            })?;
            if keep {
                kept.push(candidate);
            }
        }
        Ok(Value::array(kept))
    }

    /// `map x in items { expr }`: `expr` evaluated per element.
    pub(super) fn eval_map(&mut self, var: &str, iterable: &Expr, body: &Expr, pos: Position) -> EvalResult {
        let var = Ident::new(var, pos);
        let source = self.eval_expr(iterable)?;
        let elements = Elements::of(&source, pos)?;
        let binds_key = elements.binds_key;
        let mut mapped = Vec::new();

        for (index, element) in elements.enumerate() {
            let value = self.with_child_scope(|interp| {
                interp.bind_element(None, &var, binds_key, index, element);
                interp.eval_expr(body)
            })?;
            mapped.push(value);
        }
        Ok(Value::array(mapped))
    }
}
