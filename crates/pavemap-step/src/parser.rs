//! STEP File Parser
//!
//! `nom` combinators over the ISO 10303-21 exchange structure:
//! `ISO-10303-21;`, a HEADER section, one or more DATA sections and the
//! closing `END-ISO-10303-21;`. Comments may appear anywhere whitespace can.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace1, one_of},
    combinator::{cut, map, map_res, opt, recognize, value},
    error::Error,
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::encoding::decode_string;
use crate::{EntityId, HeaderRecord, Result, StepEntity, StepError, StepFile, StepValue};

type PResult<'a, T> = IResult<&'a str, T>;

/// Parse a complete STEP file.
pub fn parse_step(input: &str) -> Result<StepFile> {
    let mut rest = match terminated(ws(tag_no_case("ISO-10303-21")), ws(char(';')))(input) {
        Ok((rest, _)) => rest,
        Err(_) => return Err(syntax_at(input, input, "expected ISO-10303-21 exchange structure")),
    };

    let mut file = StepFile::default();
    let mut saw_data = false;
    loop {
        let (next, _) = trivia(rest).map_err(|e| syntax_error(input, e))?;
        if next.is_empty() {
            // Truncated trailer; everything before it is still usable.
            break;
        }
        let (next, parsed) = section(next).map_err(|e| syntax_error(input, e))?;
        match parsed {
            Section::Header(records) => file.header = records,
            Section::Data(entities) => {
                saw_data = true;
                for entity in entities {
                    file.insert(entity)?;
                }
            }
            Section::Skipped => {}
            Section::End => break,
            Section::Unknown(word) => {
                return Err(syntax_at(
                    input,
                    next,
                    format!("unexpected section keyword `{word}`"),
                ))
            }
        }
        rest = next;
    }

    if !saw_data {
        return Err(StepError::NoData);
    }
    Ok(file)
}

// ============================================================================
// Error mapping
// ============================================================================

/// 1-based line of `rest`, which must be a suffix of `source`.
fn line_of(source: &str, rest: &str) -> usize {
    let consumed = source.len().saturating_sub(rest.len());
    source[..consumed].matches('\n').count() + 1
}

fn syntax_at(source: &str, rest: &str, message: impl Into<String>) -> StepError {
    StepError::Syntax {
        line: line_of(source, rest),
        message: message.into(),
    }
}

fn syntax_error(source: &str, err: nom::Err<Error<&str>>) -> StepError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let near: String = e.input.chars().take(24).take_while(|c| *c != '\n').collect();
            let message = if e.input.is_empty() {
                format!("unexpected end of input ({})", e.code.description())
            } else {
                format!("unexpected input near `{near}` ({})", e.code.description())
            };
            syntax_at(source, e.input, message)
        }
        nom::Err::Incomplete(_) => syntax_at(source, "", "unexpected end of input"),
    }
}

// ============================================================================
// Sections
// ============================================================================

enum Section<'a> {
    Header(Vec<HeaderRecord>),
    Data(Vec<StepEntity>),
    Skipped,
    End,
    Unknown(&'a str),
}

fn section(input: &str) -> PResult<Section<'_>> {
    let (rest, word) = ws(keyword)(input)?;
    match word.to_ascii_uppercase().as_str() {
        "HEADER" => map(preceded(ws(char(';')), cut(header_records)), Section::Header)(rest),
        // Edition 3 named data sections: DATA(('name'),('schema'));
        "DATA" => map(
            preceded(pair(opt(ws(arg_list)), ws(char(';'))), cut(data_records)),
            Section::Data,
        )(rest),
        "ANCHOR" | "REFERENCE" | "SIGNATURE" => map(cut(skip_section), |_| Section::Skipped)(rest),
        "END-ISO-10303-21" => map(ws(char(';')), |_| Section::End)(rest),
        _ => Ok((rest, Section::Unknown(word))),
    }
}

fn end_section(input: &str) -> PResult<()> {
    value((), pair(ws(tag_no_case("ENDSEC")), ws(char(';'))))(input)
}

fn skip_section(input: &str) -> PResult<()> {
    value((), pair(take_until("ENDSEC"), end_section))(input)
}

fn header_records(input: &str) -> PResult<Vec<HeaderRecord>> {
    terminated(
        many0(map(
            terminated(pair(ws(keyword), ws(arg_list)), ws(char(';'))),
            |(name, args)| HeaderRecord {
                name: name.to_string(),
                args,
            },
        )),
        end_section,
    )(input)
}

fn data_records(input: &str) -> PResult<Vec<StepEntity>> {
    terminated(many0(entity), end_section)(input)
}

/// `#12=IFCWALL(...);` or the complex form `#12=(A(...) B(...));`.
fn entity(input: &str) -> PResult<StepEntity> {
    let (input, id) = ws(instance_id)(input)?;
    let (input, _) = cut(ws(char('=')))(input)?;
    let (input, (type_name, args)) = cut(ws(alt((complex_body, simple_body))))(input)?;
    let (input, _) = cut(ws(char(';')))(input)?;
    Ok((
        input,
        StepEntity {
            id,
            type_name,
            args,
        },
    ))
}

fn simple_body(input: &str) -> PResult<(String, Vec<StepValue>)> {
    map(pair(keyword, ws(arg_list)), |(name, args)| {
        (name.to_string(), args)
    })(input)
}

fn complex_body(input: &str) -> PResult<(String, Vec<StepValue>)> {
    map(
        delimited(
            char('('),
            many0(pair(ws(keyword), ws(arg_list))),
            cut(ws(char(')'))),
        ),
        |parts| {
            let parts = parts
                .into_iter()
                .map(|(name, args)| StepValue::typed(name, StepValue::List(args)))
                .collect();
            (String::new(), parts)
        },
    )(input)
}

// ============================================================================
// Tokens
// ============================================================================

fn comment(input: &str) -> PResult<()> {
    value((), tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

fn trivia(input: &str) -> PResult<()> {
    value((), many0(alt((value((), multispace1), comment))))(input)
}

/// Skip whitespace and comments before `inner`.
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    preceded(trivia, inner)
}

fn keyword(input: &str) -> PResult<&str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    ))(input)
}

fn instance_id(input: &str) -> PResult<EntityId> {
    map(
        preceded(char('#'), map_res(digit1, |digits: &str| digits.parse::<u64>())),
        EntityId,
    )(input)
}

fn arg_list(input: &str) -> PResult<Vec<StepValue>> {
    delimited(
        char('('),
        separated_list0(ws(char(',')), parameter),
        cut(ws(char(')'))),
    )(input)
}

fn parameter(input: &str) -> PResult<StepValue> {
    ws(alt((
        value(StepValue::Null, char('$')),
        value(StepValue::Omitted, char('*')),
        map(instance_id, StepValue::Ref),
        string,
        binary,
        enumeration,
        map(arg_list, StepValue::List),
        number,
        typed_parameter,
    )))(input)
}

/// `'...'` with doubled apostrophes collapsed and control directives decoded.
fn string(input: &str) -> PResult<StepValue> {
    let (input, _) = char('\'')(input)?;
    let (input, chunks) = many0(alt((
        take_while1(|c: char| c != '\''),
        value("'", tag("''")),
    )))(input)?;
    let (input, _) = cut(char('\''))(input)?;
    Ok((input, StepValue::Str(decode_string(&chunks.concat()))))
}

fn binary(input: &str) -> PResult<StepValue> {
    map(
        delimited(char('"'), take_while(|c: char| c != '"'), cut(char('"'))),
        |hex: &str| StepValue::Binary(hex.to_string()),
    )(input)
}

fn enumeration(input: &str) -> PResult<StepValue> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('.'),
        ),
        |name: &str| match name {
            "T" => StepValue::Bool(true),
            "F" => StepValue::Bool(false),
            _ => StepValue::Enum(name.to_string()),
        },
    )(input)
}

fn number(input: &str) -> PResult<StepValue> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            opt(pair(char('.'), digit0)),
            opt(tuple((one_of("Ee"), opt(one_of("+-")), digit1))),
        ))),
        |text: &str| match text.parse::<i64>() {
            Ok(n) if !text.contains(['.', 'E', 'e']) => Ok(StepValue::Int(n)),
            _ => text.parse::<f64>().map(StepValue::Real),
        },
    )(input)
}

/// `IFCLABEL('x')`; a single argument is unwrapped.
fn typed_parameter(input: &str) -> PResult<StepValue> {
    map(pair(keyword, ws(arg_list)), |(name, mut args)| {
        let inner = if args.len() == 1 {
            args.remove(0)
        } else {
            StepValue::List(args)
        };
        StepValue::typed(name, inner)
    })(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [ReferenceView]'),'2;1');
FILE_NAME('road.ifc','2025-03-01T10:00:00',(''),(''),'exporter','civil','');
FILE_SCHEMA(('IFC4X3_ADD2'));
ENDSEC;
DATA;
/* owner history omitted */
#1=IFCROADPART('2vYz3cR$X0XhG3xBq0jWmE',$,'Z1',$,'BaselineRegion',$,$,$,.ELEMENT.,.LONGITUDINAL.,.ROADSEGMENT.);
#2=IFCPROPERTYSINGLEVALUE('CodeName',$,IFCLABEL('Tech A - 5'),$);
#3=IFCPROPERTYSET('0aBcDeFgHiJkLmNoPqRsTu',$,'Corridor Shape Information',$,(#2));
#4=IFCCARTESIANPOINT((0.,-1.5E-3,12));
#5=(IFCLENGTHMEASURE(1.) IFCNAMEDUNIT(*,.LENGTHUNIT.));
#6=IFCPROPERTYSINGLEVALUE('N\X2\00B0\X0\_ORDRE',$,IFCTEXT('it''s'),$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn parses_header_and_data() {
        let file = parse_step(SAMPLE).expect("parse");
        assert_eq!(file.header.len(), 3);
        assert_eq!(file.schema_identifiers(), vec!["IFC4X3_ADD2".to_string()]);
        assert_eq!(file.len(), 6);

        let road_part = file.get(EntityId(1)).expect("#1");
        assert!(road_part.is_type("IfcRoadPart"));
        assert_eq!(road_part.arg(2).and_then(StepValue::as_str), Some("Z1"));
        assert_eq!(road_part.arg(10).and_then(StepValue::as_enum), Some("ROADSEGMENT"));
    }

    #[test]
    fn parses_typed_values_and_references() {
        let file = parse_step(SAMPLE).expect("parse");
        let prop = file.get(EntityId(2)).expect("#2");
        assert_eq!(
            prop.arg(2),
            Some(&StepValue::typed("IFCLABEL", StepValue::text("Tech A - 5")))
        );
        let pset = file.get(EntityId(3)).expect("#3");
        assert_eq!(pset.arg(4).map(StepValue::refs), Some(vec![EntityId(2)]));
    }

    #[test]
    fn parses_reals_with_exponent() {
        let file = parse_step(SAMPLE).expect("parse");
        let point = file.get(EntityId(4)).expect("#4");
        assert_eq!(
            point.arg(0),
            Some(&StepValue::List(vec![
                StepValue::Real(0.0),
                StepValue::Real(-0.0015),
                StepValue::Int(12),
            ]))
        );
    }

    #[test]
    fn keeps_complex_instances() {
        let file = parse_step(SAMPLE).expect("parse");
        let complex = file.get(EntityId(5)).expect("#5");
        assert!(complex.is_complex());
        assert_eq!(complex.args.len(), 2);
    }

    #[test]
    fn decodes_escaped_strings() {
        let file = parse_step(SAMPLE).expect("parse");
        let prop = file.get(EntityId(6)).expect("#6");
        assert_eq!(prop.arg(0).and_then(StepValue::as_str), Some("N°_ORDRE"));
        assert_eq!(
            prop.arg(2),
            Some(&StepValue::typed("IFCTEXT", StepValue::text("it's")))
        );
    }

    #[test]
    fn rejects_duplicate_instances() {
        let text = "ISO-10303-21;HEADER;ENDSEC;DATA;#1=IFCWALL($);#1=IFCWALL($);ENDSEC;END-ISO-10303-21;";
        assert!(matches!(parse_step(text), Err(StepError::DuplicateId(EntityId(1)))));
    }

    #[test]
    fn missing_data_section_is_an_error() {
        let text = "ISO-10303-21;HEADER;ENDSEC;END-ISO-10303-21;";
        assert!(matches!(parse_step(text), Err(StepError::NoData)));
    }

    #[test]
    fn syntax_errors_report_line() {
        let text = "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1=IFCWALL('unterminated);\n";
        match parse_step(text) {
            Err(StepError::Syntax { line, .. }) => assert!(line >= 5),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn comments_and_spacing_between_tokens() {
        let text = "ISO-10303-21;\nHEADER;ENDSEC;\nDATA;\n#1 = IFCWALL( /* a */ $ , 'x' /* b */ ,(#2, #3) ) ;\nENDSEC;\nEND-ISO-10303-21;\n";
        let file = parse_step(text).expect("parse");
        let wall = file.get(EntityId(1)).expect("#1");
        assert_eq!(wall.args.len(), 3);
        assert_eq!(wall.arg(2).map(StepValue::refs), Some(vec![EntityId(2), EntityId(3)]));
    }

    #[test]
    fn unclosed_nested_list_reports_its_line() {
        let text = "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1=IFCWALL($);\n#2=IFCWALL((#1,);\nENDSEC;\nEND-ISO-10303-21;\n";
        match parse_step(text) {
            Err(StepError::Syntax { line, .. }) => assert_eq!(line, 6),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn not_a_step_file() {
        assert!(parse_step("PK\u{3}\u{4} zip bytes").is_err());
    }
}
