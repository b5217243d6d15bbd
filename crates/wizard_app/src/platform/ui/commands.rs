use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use wizard_core::{EducationField, FieldRef, Msg, ReferenceField, RepeatableSection, SectionItem};

pub const HELP: &str = "\
commands:
  set <field> <value>            personal field (empty value clears it)
  ref <i> name|relation|contact <value>
  edu <i> school|graduation_date|gpa <value>
  skill <i> <value>
  answer <question> = <value>
  add reference|education|skill
  remove reference|education|skill <i>
  attach <slot> <path>           detach <slot>
  next  back  submit  show  help  quit";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Msg),
    /// Needs a file read before it can become a message.
    Attach { slot: String, path: PathBuf },
    Show,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Command> {
    let (verb, rest) = split_word(line.trim());
    let command = match verb {
        "set" => {
            let (name, value) = split_word(rest);
            if name.is_empty() {
                bail!("usage: set <field> <value>");
            }
            edit(FieldRef::personal(name), value)
        }
        "ref" => {
            let (index, rest) = index_arg(rest, "ref <i> <field> <value>")?;
            let (name, value) = split_word(rest);
            let field = match name {
                "name" => ReferenceField::Name,
                "relation" => ReferenceField::Relation,
                "contact" => ReferenceField::Contact,
                other => bail!("unknown reference field {other:?}"),
            };
            edit(FieldRef::Reference { index, field }, value)
        }
        "edu" => {
            let (index, rest) = index_arg(rest, "edu <i> <field> <value>")?;
            let (name, value) = split_word(rest);
            let field = match name {
                "school" => EducationField::School,
                "graduation_date" | "graduation" => EducationField::GraduationDate,
                "gpa" => EducationField::Gpa,
                other => bail!("unknown education field {other:?}"),
            };
            edit(FieldRef::Education { index, field }, value)
        }
        "skill" => {
            let (index, value) = index_arg(rest, "skill <i> <value>")?;
            edit(FieldRef::Skill { index }, value)
        }
        "answer" => {
            let (question, value) = rest
                .split_once('=')
                .context("usage: answer <question> = <value>")?;
            let question = question.trim();
            if question.is_empty() {
                bail!("usage: answer <question> = <value>");
            }
            edit(FieldRef::Answer(question.to_string()), value.trim())
        }
        "add" => Command::Dispatch(Msg::ItemAdded(SectionItem::blank(section_arg(rest)?))),
        "remove" => {
            let (name, rest) = split_word(rest);
            let section = section_arg(name)?;
            let (index, _) = index_arg(rest, "remove <section> <i>")?;
            Command::Dispatch(Msg::ItemRemoved { section, index })
        }
        "attach" => {
            let (slot, path) = split_word(rest);
            if slot.is_empty() || path.is_empty() {
                bail!("usage: attach <slot> <path>");
            }
            Command::Attach {
                slot: slot.to_string(),
                path: PathBuf::from(path),
            }
        }
        "detach" => {
            if rest.is_empty() {
                bail!("usage: detach <slot>");
            }
            Command::Dispatch(Msg::FileDetached {
                slot: rest.to_string(),
            })
        }
        "next" => Command::Dispatch(Msg::NextClicked),
        "back" => Command::Dispatch(Msg::BackClicked),
        "submit" => Command::Dispatch(Msg::SubmitClicked),
        "show" | "" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command {other:?}; type help"),
    };
    Ok(command)
}

fn edit(field: FieldRef, value: &str) -> Command {
    Command::Dispatch(Msg::FieldEdited {
        field,
        value: value.to_string(),
    })
}

/// Splits off the first whitespace-delimited word; the remainder is trimmed.
fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn index_arg<'a>(input: &'a str, usage: &str) -> Result<(usize, &'a str)> {
    let (word, rest) = split_word(input);
    let index = word
        .parse::<usize>()
        .with_context(|| format!("usage: {usage}"))?;
    Ok((index, rest))
}

fn section_arg(name: &str) -> Result<RepeatableSection> {
    match name.trim() {
        "reference" | "references" | "ref" => Ok(RepeatableSection::References),
        "education" | "edu" => Ok(RepeatableSection::Education),
        "skill" | "skills" => Ok(RepeatableSection::Skills),
        other => bail!("unknown section {other:?} (reference|education|skill)"),
    }
}
