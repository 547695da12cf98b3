//! Component sets the CLI can run.
//!
//! Both programs share a `Cli` component that turns `["Args", path...]`
//! into one `["File", path, contents]` message per path followed by
//! `["Done"]`. They differ in the component that consumes those messages.

use rlmeta_engine::{Component, Expr, Grammar, GrammarBuilder, GrammarError};
use std::sync::Arc;

/// `main = "Args" end -> put(["Done"]) kill()
///      | "Args" any:path any*:rest end
///          -> put(["File", path, read(path)]) put(["Args", ...rest])`
fn args_reader() -> Result<Grammar, GrammarError> {
    let mut g = GrammarBuilder::new("Cli");

    let tag = g.eq("Args");
    let end = g.end();
    let done = g.action(Expr::then(
        Expr::call("put", [Expr::list([Expr::lit("Done").item()])]),
        Expr::call("kill", []),
    ));
    let no_more = g.seq([tag, end, done]);

    let tag = g.eq("Args");
    let any = g.any();
    let path = g.bind("path", any);
    let any = g.any();
    let many = g.star(any);
    let rest = g.bind("rest", many);
    let end = g.end();
    let next = g.action(Expr::then(
        Expr::call(
            "put",
            [Expr::list([
                Expr::lit("File").item(),
                Expr::lookup("path").item(),
                Expr::call("read", [Expr::lookup("path")]).item(),
            ])],
        ),
        Expr::call(
            "put",
            [Expr::list([
                Expr::lit("Args").item(),
                Expr::lookup("rest").splice(1),
            ])],
        ),
    ));
    let one_more = g.seq([tag, path, rest, end, next]);

    let body = g.choice([no_more, one_more]);
    g.define("main", body);
    g.build("main")
}

/// Dispatch on the message tag: `File` runs `on_file`, `Done` exits.
fn file_sink(
    name: &str,
    on_file: impl FnOnce(&mut GrammarBuilder) -> rlmeta_engine::MatcherId,
) -> Result<Grammar, GrammarError> {
    let mut g = GrammarBuilder::new(name);

    let body = g.dispatch();
    g.define("main", body);

    let file = on_file(&mut g);
    g.define("File", file);

    let end = g.end();
    let exit = g.action(Expr::call("exit", []));
    let done = g.seq([end, exit]);
    g.define("Done", done);

    g.build("main")
}

/// `File = any any:text end -> write(text)`
fn writer() -> Result<Grammar, GrammarError> {
    file_sink("Writer", |g| {
        let path = g.any();
        let any = g.any();
        let text = g.bind("text", any);
        let end = g.end();
        let write = g.action(Expr::call("write", [Expr::lookup("text")]));
        g.seq([path, text, end, write])
    })
}

/// `File = any:path [line*]:lines end
///          -> write(join([len(lines), " ", path, "\n"]))`
///
/// `line = (~'\n' any)* '\n' | (~'\n' any)+`
fn line_counter() -> Result<Grammar, GrammarError> {
    file_sink("LineCounter", |g| {
        let char_in_line = |g: &mut GrammarBuilder| {
            let newline = g.eq('\n');
            let not_newline = g.not(newline);
            let any = g.any();
            g.seq([not_newline, any])
        };

        let c = char_in_line(g);
        let chars = g.star(c);
        let newline = g.eq('\n');
        let terminated = g.seq([chars, newline]);
        let c = char_in_line(g);
        let unterminated = g.plus(c);
        let line = g.choice([terminated, unterminated]);
        g.define("line", line);

        let any = g.any();
        let path = g.bind("path", any);
        let call = g.call("line");
        let all_lines = g.star(call);
        let all_lines = g.bind("lines", all_lines);
        let text_end = g.end();
        let text = g.seq([all_lines, text_end]);
        let lines = g.descend(text);
        let end = g.end();
        let report = g.action(Expr::call(
            "write",
            [Expr::call(
                "join",
                [Expr::list([
                    Expr::call("len", [Expr::lookup("lines")]).item(),
                    Expr::lit(" ").item(),
                    Expr::lookup("path").item(),
                    Expr::lit("\n").item(),
                ])],
            )],
        ));
        g.seq([path, lines, end, report])
    })
}

/// Available programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Program {
    /// Write the contents of each file in order
    Cat,
    /// Write the number of lines of each file
    Lines,
}

impl Program {
    pub fn components(self) -> Result<Vec<Component>, GrammarError> {
        let sink = match self {
            Program::Cat => writer()?,
            Program::Lines => line_counter()?,
        };
        Ok(vec![
            Component::new(Arc::new(args_reader()?)),
            Component::new(Arc::new(sink)),
        ])
    }
}
