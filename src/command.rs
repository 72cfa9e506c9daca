use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Error, Result};

use crate::filters::DateRange;

pub(crate) const USAGE: &str = "COMMANDS:
    list                        Show categories with selection and weight
    toggle <CATEGORY>           Select or unselect a category
    weight <CATEGORY> <1-5>     Rate a category
    q [TEXT]                    Set the free-text query (empty clears it)
    dates <START|-> <END|->     Set the date range, `-` for no bound
    sort                        Toggle sorting by date
    city <NAME|#N>              Restrict events to a city
    search                      Run the search again
    help                        Show this message
    quit                        Leave";

/// A city given by name or by its number in the last shortlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CityTarget {
    Name(String),
    Number(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    List,
    Toggle(String),
    Weight(String, i64),
    Query(String),
    Dates(DateRange),
    Sort,
    City(CityTarget),
    Search,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "list" | "ls" => Command::List,
            "toggle" => Command::Toggle(required(rest, "toggle needs a category")?),
            "weight" => {
                let (label, value) = rest
                    .rsplit_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("weight needs a category and a value"))?;
                let value = value
                    .parse::<i64>()
                    .with_context(|| format!("`{value}` is not a weight"))?;
                Command::Weight(required(label, "weight needs a category")?, value)
            }
            "q" | "query" => Command::Query(rest.to_string()),
            "dates" => {
                let mut bounds = rest.split_whitespace();
                let start = bound(bounds.next());
                let end = bound(bounds.next());
                if bounds.next().is_some() {
                    bail!("dates takes at most two values");
                }
                Command::Dates(DateRange::new(start, end))
            }
            "sort" => Command::Sort,
            "city" => {
                let target = required(rest, "city needs a name or #number")?;
                match target.strip_prefix('#') {
                    Some(number) => Command::City(CityTarget::Number(
                        number
                            .parse()
                            .with_context(|| format!("`{target}` is not a city number"))?,
                    )),
                    None => Command::City(CityTarget::Name(target)),
                }
            }
            "search" => Command::Search,
            "quit" | "exit" => Command::Quit,
            other => bail!("Unknown command `{other}`"),
        };
        Ok(command)
    }
}

fn required(value: &str, message: &'static str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        bail!(message);
    }
    Ok(value.to_string())
}

fn bound(value: Option<&str>) -> Option<&str> {
    value.filter(|v| *v != "-")
}
