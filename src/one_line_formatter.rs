use colored::{ColoredString, Colorize};
use nix::unistd::Pid;

use trace2prog::{
    ArgumentValue, Conversion, ErrnoVariant, IntKind, Program, ResolvedCall, ResourceArg,
    SyscallResult, UnionChoice,
};

use crate::colors::{
    ADDRESS_COLOR, FALLBACK_BACKGROUND_COLOR, GENERAL_TEXT_COLOR, HANDLE_COLOR, OUR_YELLOW,
    PID_NUMBER_COLOR, VARIANT_COLOR,
};

// strings longer than this are cut when printed
const STRING_LIMIT: usize = 36;

pub fn process_header(program: &Program, conversion: &Conversion) -> Vec<ColoredString> {
    let mut one_line = vec![
        "\n".white(),
        " PROCESS ".on_black(),
        " ".dimmed(),
        program.pid.to_string().custom_color(*PID_NUMBER_COLOR),
    ];
    match program.parent {
        Some(parent) => {
            one_line.push(" forked from ".custom_color(*GENERAL_TEXT_COLOR));
            one_line.push(parent.to_string().custom_color(*PID_NUMBER_COLOR));
        }
        None if program.pid == conversion.root => {
            one_line.push(" root".custom_color(*GENERAL_TEXT_COLOR));
        }
        None => {}
    }
    let children = conversion.children(program.pid);
    if !children.is_empty() {
        one_line.push(" forks".custom_color(*GENERAL_TEXT_COLOR));
        for child in children {
            one_line.push(" ".dimmed());
            one_line.push(child.to_string().custom_color(*PID_NUMBER_COLOR));
        }
    }
    one_line.push(format!(" - {} calls", program.calls.len()).dimmed());
    one_line
}

pub fn one_line(pid: Pid, call: &ResolvedCall) -> Vec<ColoredString> {
    let pid_text = pid.to_string();
    let mut one_line = vec![
        "\n".white(),
        match call.failed() {
            true => pid_text.red(),
            false => pid_text.blue(),
        },
        " ".dimmed(),
    ];
    if let Some(handle) = &call.ret {
        one_line.push(format!("r{}", handle.id).custom_color(*HANDLE_COLOR));
        one_line.push(" = ".dimmed());
    }
    one_line.push(call.variant.custom_color(*VARIANT_COLOR));
    one_line.push("(".custom_color(*GENERAL_TEXT_COLOR));
    for (position, argument) in call.args.iter().enumerate() {
        if position > 0 {
            one_line.push(", ".custom_color(*GENERAL_TEXT_COLOR));
        }
        format_argument(argument, &mut one_line);
    }
    one_line.push(")".custom_color(*GENERAL_TEXT_COLOR));
    match &call.result {
        SyscallResult::Success(value) => {
            one_line.push(format!(" = {value}").custom_color(*GENERAL_TEXT_COLOR));
        }
        SyscallResult::Fail(errno) => one_line_error(errno.as_ref(), &mut one_line),
    }
    if call.fallback {
        one_line.push(" ".dimmed());
        one_line.push(" GENERIC ".on_custom_color(*FALLBACK_BACKGROUND_COLOR));
    }
    one_line.push(format!("  # line {}", call.line).dimmed());
    one_line
}

pub fn one_line_error(errno: Option<&ErrnoVariant>, one_line: &mut Vec<ColoredString>) {
    one_line.push(" |=> ".white());
    match errno {
        Some(errno) => one_line.push(errno.to_string().red()),
        None => one_line.push("unknown result".red()),
    }
}

pub fn format_argument(value: &ArgumentValue, one_line: &mut Vec<ColoredString>) {
    match value {
        ArgumentValue::Integer { value, kind, .. } => one_line.push(match kind {
            IntKind::Flags | IntKind::Const => format!("{value:#x}").custom_color(*OUR_YELLOW),
            IntKind::Plain | IntKind::Len => value.to_string().custom_color(*OUR_YELLOW),
        }),
        ArgumentValue::Resource { arg, .. } => one_line.push(match arg {
            ResourceArg::Use(handle) => format!("r{}", handle.id).custom_color(*HANDLE_COLOR),
            ResourceArg::Produce(handle) => {
                format!("<r{}=>{:#x}>", handle.id, handle.raw).custom_color(*HANDLE_COLOR)
            }
            ResourceArg::Literal(raw) => format!("{raw:#x}").custom_color(*OUR_YELLOW),
        }),
        ArgumentValue::Data(bytes) => one_line.push(quote_bytes(bytes).normal()),
        ArgumentValue::Buffer(region) => {
            one_line.push(format!("&({:#x})=", region.base_address).custom_color(*ADDRESS_COLOR));
            one_line.push(quote_bytes(&region.contents).normal());
        }
        ArgumentValue::Pointer { region: None, .. } => {
            one_line.push("0x0".custom_color(*ADDRESS_COLOR));
        }
        ArgumentValue::Pointer {
            region: Some(region),
            pointee,
        } => {
            one_line.push(format!("&({:#x})", region.base_address).custom_color(*ADDRESS_COLOR));
            if let Some(pointee) = pointee {
                one_line.push("=".custom_color(*GENERAL_TEXT_COLOR));
                format_argument(pointee, one_line);
            }
        }
        ArgumentValue::Struct { fields, .. } => {
            one_line.push("{".custom_color(*GENERAL_TEXT_COLOR));
            for (position, (_, field)) in fields.iter().enumerate() {
                if position > 0 {
                    one_line.push(", ".custom_color(*GENERAL_TEXT_COLOR));
                }
                format_argument(field, one_line);
            }
            one_line.push("}".custom_color(*GENERAL_TEXT_COLOR));
        }
        ArgumentValue::Union { choice, value, .. } => {
            match choice {
                UnionChoice::Branch { name, .. } => {
                    one_line.push(format!("@{name}=").custom_color(*VARIANT_COLOR))
                }
                UnionChoice::Opaque { discriminant } => one_line.push(
                    format!("@raw[{}]=", discriminant.map_or("?".to_string(), |tag| tag.to_string()))
                        .custom_color(*VARIANT_COLOR),
                ),
            }
            format_argument(value, one_line);
        }
        ArgumentValue::Array(elements) => {
            one_line.push("[".custom_color(*GENERAL_TEXT_COLOR));
            for (position, element) in elements.iter().enumerate() {
                if position > 0 {
                    one_line.push(", ".custom_color(*GENERAL_TEXT_COLOR));
                }
                format_argument(element, one_line);
            }
            one_line.push("]".custom_color(*GENERAL_TEXT_COLOR));
        }
    }
}

pub fn quote_bytes(bytes: &[u8]) -> String {
    let mut quoted = String::from("\"");
    for byte in bytes.iter().take(STRING_LIMIT) {
        match byte {
            b'"' => quoted.push_str("\\\""),
            b'\\' => quoted.push_str("\\\\"),
            0x20..=0x7e => quoted.push(char::from(*byte)),
            _ => quoted.push_str(&format!("\\x{byte:02x}")),
        }
    }
    quoted.push('"');
    if bytes.len() > STRING_LIMIT {
        quoted.push_str("...");
    }
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace2prog::{convert_trace, ConvertOptions, SkeletonCatalog};

    fn plain(one_line: &[ColoredString]) -> String {
        one_line.iter().map(|piece| &**piece).collect()
    }

    #[test]
    fn bytes_are_escaped_and_cut() {
        assert_eq!(quote_bytes(b"a\0\"b"), "\"a\\x00\\\"b\"");
        assert!(quote_bytes(&[b'x'; 40]).ends_with("\"..."));
    }

    #[test]
    fn calls_print_handles_and_results() {
        let conversion = convert_trace(
            "open(\"f\", 0) = 3\nclose(3) = 0\nclose(9) = -1 EBADF (Bad file descriptor)\n",
            &SkeletonCatalog,
            &ConvertOptions::default(),
        )
        .unwrap();
        let program = conversion.root_program().unwrap();
        let lines: Vec<String> = program
            .calls
            .iter()
            .map(|call| plain(&one_line(program.pid, call)))
            .collect();
        assert!(lines[0].starts_with("\n0 r0 = open(&(0x7f0000000000)=\"f\\x00\", 0x0, 0x0) = 3"));
        assert!(lines[1].contains("close(r0) = 0"));
        assert!(lines[2].contains("close(0x9) |=> EBADF"));

        let header = plain(&process_header(program, &conversion));
        assert!(header.contains("0 root - 3 calls"));
    }

    #[test]
    fn headers_name_parents_and_children() {
        let conversion = convert_trace(
            "10 fork() = 11
10 fork() = 12
11 getpid() = 11
12 getpid() = 12
",
            &SkeletonCatalog,
            &ConvertOptions::default(),
        )
        .unwrap();
        let parent = conversion.program(Pid::from_raw(10)).unwrap();
        let child = conversion.program(Pid::from_raw(12)).unwrap();
        assert!(plain(&process_header(parent, &conversion)).contains("10 root forks 11 12 - 2 calls"));
        assert!(plain(&process_header(child, &conversion)).contains("12 forked from 10 - 1 calls"));
    }
}
