//! The bundled default evaluator behind [`crate::SparqlFactory`]. Walks a
//! `spargebra` algebra tree directly against a `rdf_store::Model`, using
//! `Model::find_statements` as the only access path into storage — there is
//! no separate query-plan/index layer here, by design (spec §1 keeps the
//! query engine a collaborator; this is the minimal thing standing in for
//! it).
//!
//! A binding is a map from SPARQL variable name to the `Node` it is bound
//! to; a row set is evaluated bottom-up, left to right, exactly mirroring
//! the shape of the parsed algebra tree.

use std::cmp::Ordering;
use std::collections::HashMap;

use oxrdf::Literal as OxLiteral;
use spargebra::algebra::{Expression, GraphPattern, OrderExpression};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};

use rdf_model::stream::VecStatementSource;
use rdf_model::{Error, Node, Result, Statement, Stream, World};
use rdf_store::{Binding, Model, Results};

type Row = HashMap<String, Node>;

pub fn execute(world: &World, model: &Model, query: &spargebra::Query) -> Result<Results> {
    match query {
        spargebra::Query::Select { pattern, .. } => {
            let rows = eval(world, model, pattern, None, vec![Row::new()])?;
            let variables = projected_variables(pattern, &rows);
            Ok(Results::Bindings {
                rows: rows_to_bindings(&variables, rows),
                variables,
            })
        }
        spargebra::Query::Ask { pattern, .. } => {
            let rows = eval(world, model, pattern, None, vec![Row::new()])?;
            Ok(Results::Boolean(!rows.is_empty()))
        }
        spargebra::Query::Construct { template, pattern, .. } => {
            let rows = eval(world, model, pattern, None, vec![Row::new()])?;
            let mut items = Vec::new();
            for row in &rows {
                for tp in template {
                    if let Some(statement) = instantiate(world, tp, row)? {
                        items.push((statement, None));
                    }
                }
            }
            Ok(Results::Graph(Stream::new(Box::new(VecStatementSource::new(items)))))
        }
        spargebra::Query::Describe { pattern, .. } => {
            let rows = eval(world, model, pattern, None, vec![Row::new()])?;
            let mut seen: Vec<Node> = Vec::new();
            let mut items = Vec::new();
            for row in &rows {
                for node in row.values() {
                    if seen.contains(node) {
                        continue;
                    }
                    seen.push(node.clone());
                    describe(model, node, &mut items)?;
                }
            }
            Ok(Results::Graph(Stream::new(Box::new(VecStatementSource::new(items)))))
        }
    }
}

fn eval(
    world: &World,
    model: &Model,
    pattern: &GraphPattern,
    graph: Option<&Node>,
    rows: Vec<Row>,
) -> Result<Vec<Row>> {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            let mut current = rows;
            for tp in patterns {
                let mut next = Vec::new();
                for row in &current {
                    next.extend(apply_triple_pattern(world, model, tp, graph, row)?);
                }
                current = next;
            }
            Ok(current)
        }
        GraphPattern::Join { left, right } => {
            let left_rows = eval(world, model, left, graph, rows)?;
            eval(world, model, right, graph, left_rows)
        }
        GraphPattern::Union { left, right } => {
            let mut out = eval(world, model, left, graph, rows.clone())?;
            out.extend(eval(world, model, right, graph, rows)?);
            Ok(out)
        }
        GraphPattern::Filter { expr, inner } => {
            let mut out = Vec::new();
            for row in eval(world, model, inner, graph, rows)? {
                if eval_bool(world, expr, &row)? {
                    out.push(row);
                }
            }
            Ok(out)
        }
        GraphPattern::Graph { name, inner } => eval_graph(world, model, name, inner, rows),
        GraphPattern::Extend {
            inner,
            variable,
            expression,
        } => {
            let mut out = Vec::new();
            for mut row in eval(world, model, inner, graph, rows)? {
                if let Some(node) = eval_term(world, expression, &row)? {
                    row.insert(variable.as_str().to_owned(), node);
                }
                out.push(row);
            }
            Ok(out)
        }
        GraphPattern::Project { inner, variables } => {
            let keep: Vec<&str> = variables.iter().map(|v| v.as_str()).collect();
            Ok(eval(world, model, inner, graph, rows)?
                .into_iter()
                .map(|row| row.into_iter().filter(|(k, _)| keep.contains(&k.as_str())).collect())
                .collect())
        }
        GraphPattern::Distinct { inner } => {
            let mut out = eval(world, model, inner, graph, rows)?;
            dedup(&mut out);
            Ok(out)
        }
        GraphPattern::Reduced { inner } => eval(world, model, inner, graph, rows),
        GraphPattern::Slice { inner, start, length } => {
            let out = eval(world, model, inner, graph, rows)?;
            let start = *start;
            Ok(match length {
                Some(len) => out.into_iter().skip(start).take(*len).collect(),
                None => out.into_iter().skip(start).collect(),
            })
        }
        GraphPattern::OrderBy { inner, expression } => {
            let mut out = eval(world, model, inner, graph, rows)?;
            sort_rows(world, &mut out, expression);
            Ok(out)
        }
        other => Err(Error::query_error(format!(
            "unsupported SPARQL algebra operator: {other:?}"
        ))),
    }
}

/// Unifying a single triple pattern against storage: each slot is either
/// already bound (from `row` or a pattern constant, pushed down into the
/// `Statement` wildcard query) or a fresh variable captured from whatever
/// `find_statements` returns. A variable repeated twice within one triple
/// pattern (e.g. `?s ?p ?s`) is not cross-checked for equality — a known
/// simplification of this bundled evaluator, not the full SPARQL semantics.
fn apply_triple_pattern(
    world: &World,
    model: &Model,
    tp: &TriplePattern,
    graph: Option<&Node>,
    row: &Row,
) -> Result<Vec<Row>> {
    let subject = resolve_term(world, &tp.subject, row)?;
    let predicate = resolve_predicate(world, &tp.predicate, row)?;
    let object = resolve_term(world, &tp.object, row)?;

    let mut query_pattern = Statement::new();
    if let Some(n) = &subject.ground {
        query_pattern.set_subject(n.clone())?;
    }
    if let Some(n) = &predicate.ground {
        query_pattern.set_predicate(n.clone())?;
    }
    if let Some(n) = &object.ground {
        query_pattern.set_object(n.clone());
    }
    if let Some(g) = graph {
        query_pattern.set_graph(Some(g.clone()))?;
    }

    let mut out = Vec::new();
    let mut stream = model.find_statements(&query_pattern)?;
    while !stream.end() {
        if let Some(statement) = stream.current() {
            let mut next = row.clone();
            bind(&mut next, &subject, statement.subject());
            bind(&mut next, &predicate, statement.predicate());
            bind(&mut next, &object, statement.object());
            out.push(next);
        }
        stream.next();
    }
    Ok(out)
}

struct Slot {
    ground: Option<Node>,
    var: Option<String>,
}

fn bind(row: &mut Row, slot: &Slot, found: Option<&Node>) {
    if let (Some(var), Some(found)) = (&slot.var, found) {
        row.insert(var.clone(), found.clone());
    }
}

fn resolve_term(world: &World, term: &TermPattern, row: &Row) -> Result<Slot> {
    if let TermPattern::Variable(v) = term {
        return Ok(match row.get(v.as_str()) {
            Some(node) => Slot {
                ground: Some(node.clone()),
                var: None,
            },
            None => Slot {
                ground: None,
                var: Some(v.as_str().to_owned()),
            },
        });
    }
    Ok(Slot {
        ground: Some(ground_term_node(world, term)?),
        var: None,
    })
}

fn resolve_predicate(world: &World, pred: &NamedNodePattern, row: &Row) -> Result<Slot> {
    match pred {
        NamedNodePattern::Variable(v) => Ok(match row.get(v.as_str()) {
            Some(node) => Slot {
                ground: Some(node.clone()),
                var: None,
            },
            None => Slot {
                ground: None,
                var: Some(v.as_str().to_owned()),
            },
        }),
        NamedNodePattern::NamedNode(n) => Ok(Slot {
            ground: Some(Node::iri_str(world, n.as_str())?),
            var: None,
        }),
    }
}

fn ground_term_node(world: &World, term: &TermPattern) -> Result<Node> {
    match term {
        TermPattern::NamedNode(n) => Node::iri_str(world, n.as_str()),
        TermPattern::BlankNode(b) => Node::blank_str(world, b.as_str()),
        TermPattern::Literal(l) => literal_node(world, l),
        TermPattern::Variable(_) => unreachable!("handled by resolve_term"),
        #[allow(unreachable_patterns)]
        _ => Err(Error::query_error("RDF-star triple patterns are not supported")),
    }
}

fn literal_node(world: &World, literal: &OxLiteral) -> Result<Node> {
    if let Some(language) = literal.language() {
        return Node::language_literal(world, literal.value(), language);
    }
    let datatype = literal.datatype();
    if datatype.as_str() == "http://www.w3.org/2001/XMLSchema#string" {
        Node::plain_literal(world, literal.value())
    } else {
        Node::literal(world, literal.value().as_bytes(), None, Some(datatype.as_str().as_bytes()))
    }
}

fn eval_graph(
    world: &World,
    model: &Model,
    name: &NamedNodePattern,
    inner: &GraphPattern,
    rows: Vec<Row>,
) -> Result<Vec<Row>> {
    match name {
        NamedNodePattern::NamedNode(n) => {
            let graph = Node::iri_str(world, n.as_str())?;
            eval(world, model, inner, Some(&graph), rows)
        }
        NamedNodePattern::Variable(v) => {
            let mut out = Vec::new();
            for graph in model.contexts()? {
                let bound: Vec<Row> = rows
                    .iter()
                    .map(|row| {
                        let mut row = row.clone();
                        row.insert(v.as_str().to_owned(), graph.clone());
                        row
                    })
                    .collect();
                out.extend(eval(world, model, inner, Some(&graph), bound)?);
            }
            Ok(out)
        }
    }
}

fn eval_term(world: &World, expr: &Expression, row: &Row) -> Result<Option<Node>> {
    match expr {
        Expression::NamedNode(n) => Ok(Some(Node::iri_str(world, n.as_str())?)),
        Expression::Literal(l) => Ok(Some(literal_node(world, l)?)),
        Expression::Variable(v) => Ok(row.get(v.as_str()).cloned()),
        Expression::If(cond, then_expr, else_expr) => {
            if eval_bool(world, cond, row)? {
                eval_term(world, then_expr, row)
            } else {
                eval_term(world, else_expr, row)
            }
        }
        Expression::Coalesce(list) => {
            for candidate in list {
                if let Some(node) = eval_term(world, candidate, row)? {
                    return Ok(Some(node));
                }
            }
            Ok(None)
        }
        _ => Err(Error::query_error("unsupported SPARQL expression form")),
    }
}

fn eval_bool(world: &World, expr: &Expression, row: &Row) -> Result<bool> {
    match expr {
        Expression::And(l, r) => Ok(eval_bool(world, l, row)? && eval_bool(world, r, row)?),
        Expression::Or(l, r) => Ok(eval_bool(world, l, row)? || eval_bool(world, r, row)?),
        Expression::Not(e) => Ok(!eval_bool(world, e, row)?),
        Expression::Bound(v) => Ok(row.contains_key(v.as_str())),
        Expression::Equal(l, r) | Expression::SameTerm(l, r) => {
            Ok(eval_term(world, l, row)? == eval_term(world, r, row)?)
        }
        _ => Ok(eval_term(world, expr, row)?.is_some_and(|node| effective_boolean(&node))),
    }
}

fn effective_boolean(node: &Node) -> bool {
    match node.as_literal() {
        Some(literal) => {
            let v = literal.value_str();
            !(v.is_empty() || v == "false" || v == "0")
        }
        None => true,
    }
}

fn sort_rows(world: &World, rows: &mut [Row], exprs: &[OrderExpression]) {
    rows.sort_by(|a, b| {
        for order in exprs {
            let (expr, desc) = match order {
                OrderExpression::Asc(e) => (e, false),
                OrderExpression::Desc(e) => (e, true),
            };
            let av = eval_term(world, expr, a).ok().flatten();
            let bv = eval_term(world, expr, b).ok().flatten();
            let ord = compare_optional(av.as_ref(), bv.as_ref());
            let ord = if desc { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn compare_optional(a: Option<&Node>, b: Option<&Node>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

fn rows_equal(a: &Row, b: &Row) -> bool {
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
}

fn dedup(rows: &mut Vec<Row>) {
    let mut out: Vec<Row> = Vec::with_capacity(rows.len());
    for row in rows.drain(..) {
        if !out.iter().any(|seen| rows_equal(seen, &row)) {
            out.push(row);
        }
    }
    *rows = out;
}

/// Finds the variable list a `SELECT` projects, by walking down through the
/// wrapping operators `spargebra` inserts around the core pattern (`spargebra`
/// always inserts a `Project` even for `SELECT *`). Falls back to the union
/// of every row's own keys if no `Project` is found, which should not occur
/// for a query that parsed successfully.
fn projected_variables(pattern: &GraphPattern, rows: &[Row]) -> Vec<String> {
    fn find(pattern: &GraphPattern) -> Option<Vec<String>> {
        match pattern {
            GraphPattern::Project { variables, .. } => {
                Some(variables.iter().map(|v| v.as_str().to_owned()).collect())
            }
            GraphPattern::Slice { inner, .. }
            | GraphPattern::Distinct { inner }
            | GraphPattern::Reduced { inner }
            | GraphPattern::OrderBy { inner, .. }
            | GraphPattern::Filter { inner, .. } => find(inner),
            _ => None,
        }
    }
    find(pattern).unwrap_or_else(|| {
        let mut vars: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !vars.contains(key) {
                    vars.push(key.clone());
                }
            }
        }
        vars
    })
}

fn rows_to_bindings(variables: &[String], rows: Vec<Row>) -> Vec<Binding> {
    rows.into_iter()
        .map(|row| variables.iter().map(|v| (v.clone(), row.get(v).cloned())).collect())
        .collect()
}

fn instantiate(world: &World, tp: &TriplePattern, row: &Row) -> Result<Option<Statement>> {
    let subject = construct_term(world, &tp.subject, row)?;
    let predicate = construct_predicate(world, &tp.predicate, row)?;
    let object = construct_term(world, &tp.object, row)?;
    match (subject, predicate, object) {
        (Some(s), Some(p), Some(o)) => Ok(Some(Statement::from_nodes(s, p, o)?)),
        _ => Ok(None),
    }
}

fn construct_term(world: &World, term: &TermPattern, row: &Row) -> Result<Option<Node>> {
    if let TermPattern::Variable(v) = term {
        return Ok(row.get(v.as_str()).cloned());
    }
    Ok(Some(ground_term_node(world, term)?))
}

fn construct_predicate(world: &World, pred: &NamedNodePattern, row: &Row) -> Result<Option<Node>> {
    match pred {
        NamedNodePattern::Variable(v) => Ok(row.get(v.as_str()).cloned()),
        NamedNodePattern::NamedNode(n) => Ok(Some(Node::iri_str(world, n.as_str())?)),
    }
}

fn describe(model: &Model, node: &Node, items: &mut Vec<(Statement, Option<Node>)>) -> Result<()> {
    if node.is_iri() || node.is_blank() {
        let mut as_subject = Statement::new();
        as_subject.set_subject(node.clone())?;
        items.extend(model.find_statements(&as_subject)?.collect().into_iter().map(|s| (s, None)));
    }
    let mut as_object = Statement::new();
    as_object.set_object(node.clone());
    items.extend(model.find_statements(&as_object)?.collect().into_iter().map(|s| (s, None)));
    Ok(())
}
