//! Expression evaluator
//!
//! Evaluates a token sequence by recursive splitting: a range is either a
//! single operand, a parenthesized range, or is split at its main operator
//! (the loosest-binding operator outside any parentheses).

use std::ops::Range;

use log::{debug, trace};

use super::error::EvalError;
use super::token::{Token, TokenKind};
use crate::machine::{MemoryReader, RegisterLookup, Word, DEREF_WIDTH};

/// Expression evaluator bound to a machine's registers and memory
pub struct Evaluator<R, M> {
    registers: R,
    memory: M,
}

impl<R: RegisterLookup, M: MemoryReader> Evaluator<R, M> {
    pub fn new(registers: R, memory: M) -> Self {
        Self { registers, memory }
    }

    /// Evaluate a whole token sequence
    ///
    /// Dereferences must already be reclassified
    /// (see [`reclassify_dereference`](super::lexer::reclassify_dereference)).
    pub fn eval(&self, tokens: &[Token]) -> Result<Word, EvalError> {
        check_balanced(tokens)?;
        let value = self.eval_range(tokens, 0..tokens.len())?;
        debug!("evaluated {} tokens to {:#x}", tokens.len(), value);
        Ok(value)
    }

    /// Evaluate the tokens in `range`
    pub fn eval_range(&self, tokens: &[Token], range: Range<usize>) -> Result<Word, EvalError> {
        let Range { start, end } = range;
        trace!("eval [{}, {})", start, end);

        if start >= end {
            return Err(EvalError::EmptyOperand { position: start });
        }

        if end - start == 1 {
            return self.eval_operand(&tokens[start]);
        }

        if is_wrapped(tokens, start, end) {
            return self.eval_range(tokens, start + 1..end - 1);
        }

        let posi = main_operator(tokens, start, end)?;
        let op = &tokens[posi].kind;
        trace!("main operator '{}' at {}", op.as_str(), posi);

        if op.is_unary() {
            let address = self.eval_range(tokens, posi + 1..end)?;
            return Ok(self.memory.read(address, DEREF_WIDTH)?);
        }

        let left = self.eval_range(tokens, start..posi)?;
        let right = self.eval_range(tokens, posi + 1..end)?;
        apply_binop(op, left, right)
    }

    fn eval_operand(&self, token: &Token) -> Result<Word, EvalError> {
        match &token.kind {
            TokenKind::Number(value) => Ok(*value),
            TokenKind::Register(name) => Ok(self.registers.lookup(name)?),
            _ => Err(EvalError::NotAValue {
                token: token.text.clone(),
            }),
        }
    }
}

/// Evaluate a token sequence against the given registers and memory
pub fn evaluate<R, M>(tokens: &[Token], registers: R, memory: M) -> Result<Word, EvalError>
where
    R: RegisterLookup,
    M: MemoryReader,
{
    Evaluator::new(registers, memory).eval(tokens)
}

fn apply_binop(op: &TokenKind, left: Word, right: Word) -> Result<Word, EvalError> {
    let result = match op {
        TokenKind::Plus => left.wrapping_add(right),
        TokenKind::Minus => left.wrapping_sub(right),
        TokenKind::Star => left.wrapping_mul(right),
        TokenKind::Slash => left.checked_div(right).ok_or(EvalError::DivisionByZero)?,
        TokenKind::Equal => Word::from(left == right),
        TokenKind::NotEqual => Word::from(left != right),
        TokenKind::And => Word::from(left != 0 && right != 0),
        other => {
            return Err(EvalError::NotAValue {
                token: other.as_str().to_string(),
            })
        }
    };
    Ok(result)
}

/// Every `(` has a matching `)` and vice versa
fn check_balanced(tokens: &[Token]) -> Result<(), EvalError> {
    let mut open = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => open.push(i),
            TokenKind::RParen => {
                if open.pop().is_none() {
                    return Err(EvalError::UnmatchedParentheses { position: i });
                }
            }
            _ => {}
        }
    }
    match open.pop() {
        Some(position) => Err(EvalError::UnmatchedParentheses { position }),
        None => Ok(()),
    }
}

/// `tokens[start..end]` is exactly one parenthesized group
fn is_wrapped(tokens: &[Token], start: usize, end: usize) -> bool {
    if tokens[start].kind != TokenKind::LParen || tokens[end - 1].kind != TokenKind::RParen {
        return false;
    }

    let mut depth = 0usize;
    for token in &tokens[start..end - 1] {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                // Closed the opening paren before the final one: "(a) + (b)"
                if depth == 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 1
}

/// Index of the main operator of `tokens[start..end]`
///
/// The loosest class outside parentheses wins. Binary ties go to the
/// rightmost operator (left associativity); dereference ties go to the
/// leftmost so that `**a` reads `*(*a)`.
fn main_operator(tokens: &[Token], start: usize, end: usize) -> Result<usize, EvalError> {
    let mut depth = 0usize;
    let mut best: Option<(usize, u8)> = None;
    let mut juxtaposed = None;

    for i in start..end {
        let kind = &tokens[i].kind;
        match kind {
            TokenKind::LParen => {
                if depth == 0 && i > start && tokens[i - 1].kind.ends_operand() {
                    juxtaposed.get_or_insert(i);
                }
                depth += 1;
                continue;
            }
            TokenKind::RParen => {
                depth = depth.saturating_sub(1);
                continue;
            }
            _ if depth > 0 => continue,
            _ => {}
        }

        match kind.precedence() {
            Some(class) => {
                let replace = match best {
                    None => true,
                    Some((_, best_class)) => {
                        class > best_class || (class == best_class && !kind.is_unary())
                    }
                };
                if replace {
                    best = Some((i, class));
                }
            }
            None => {
                if i > start && tokens[i - 1].kind.ends_operand() {
                    juxtaposed.get_or_insert(i);
                }
            }
        }
    }

    match best {
        Some((posi, _)) if tokens[posi].kind.is_unary() && posi != start => {
            Err(EvalError::MissingOperator { position: posi })
        }
        Some((posi, _)) => Ok(posi),
        None => Err(EvalError::MissingOperator {
            position: juxtaposed.unwrap_or(start + 1),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::lexer::{reclassify_dereference, tokenize};
    use crate::machine::Machine;

    fn machine() -> Machine {
        let mut machine = Machine::new(0, 0x100);
        machine.memory.write(0x0, 4, 0xdead_beef).unwrap();
        machine.memory.write(0x10, 4, 0x20).unwrap();
        machine.memory.write(0x20, 4, 42).unwrap();
        machine.registers.set("sp", 0x10).unwrap();
        machine.registers.set("a0", 3).unwrap();
        machine
    }

    fn eval_with(machine: &Machine, input: &str) -> Result<Word, EvalError> {
        let mut tokens = tokenize(input)?;
        reclassify_dereference(&mut tokens);
        evaluate(&tokens, &machine.registers, &machine.memory)
    }

    fn eval(input: &str) -> Result<Word, EvalError> {
        eval_with(&machine(), input)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1+2*3").unwrap(), 7);
        assert_eq!(eval("(1+2)*3").unwrap(), 9);
        assert_eq!(eval("2*3+4*5").unwrap(), 26);
        assert_eq!(eval("1+1==2").unwrap(), 1);
        assert_eq!(eval("1==1 && 2!=3").unwrap(), 1);
        assert_eq!(eval("1==1 && 2==3").unwrap(), 0);
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(eval("8-3-2").unwrap(), 3);
        assert_eq!(eval("64/4/2").unwrap(), 8);
        assert_eq!(eval("8-(3-2)").unwrap(), 7);
        assert_eq!(eval("1==1==1").unwrap(), 1);
        assert_eq!(eval("2==2==2").unwrap(), 0);
    }

    #[test]
    fn test_unsigned_wraparound() {
        assert_eq!(eval("0-1").unwrap(), u32::MAX);
        assert_eq!(eval("0xffffffff+2").unwrap(), 1);
        assert_eq!(eval("0x10000*0x10000").unwrap(), 0);
        assert_eq!(eval("(0-4)/2").unwrap(), 0x7fff_fffe);
    }

    #[test]
    fn test_logical_and_is_boolean() {
        assert_eq!(eval("5 && 7").unwrap(), 1);
        assert_eq!(eval("5 && 0").unwrap(), 0);
        assert_eq!(eval("0 && 0").unwrap(), 0);
    }

    #[test]
    fn test_registers() {
        assert_eq!(eval("$a0 * 2").unwrap(), 6);
        assert_eq!(eval("$0").unwrap(), 0);
        assert_eq!(eval("$pc").unwrap(), 0);
        assert_eq!(
            eval("$bad_reg"),
            Err(EvalError::UndefinedRegister {
                name: "bad_reg".to_string()
            })
        );
        assert!(matches!(
            eval("1 + $nope"),
            Err(EvalError::UndefinedRegister { .. })
        ));
    }

    #[test]
    fn test_dereference() {
        let m = machine();
        assert_eq!(
            eval_with(&m, "*0x0").unwrap(),
            m.memory.read(0, 4).unwrap()
        );
        assert_eq!(eval("*$sp").unwrap(), 0x20);
        assert_eq!(eval("**$sp").unwrap(), 42);
        assert_eq!(eval("*($sp + 0x10)").unwrap(), 42);
        assert_eq!(eval("*$sp + 1").unwrap(), 0x21);
        assert_eq!(eval("2 * *$sp").unwrap(), 0x40);
        assert_eq!(eval("*0x10 * 2").unwrap(), 0x40);
    }

    #[test]
    fn test_dereference_out_of_memory() {
        assert_eq!(
            eval("*0x1000"),
            Err(EvalError::BadAddress { address: 0x1000 })
        );
        assert_eq!(eval("*0xfe"), Err(EvalError::BadAddress { address: 0xfe }));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1/0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1 + 4/(2-2)"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_empty_operands() {
        assert_eq!(eval(""), Err(EvalError::EmptyOperand { position: 0 }));
        assert_eq!(eval("()"), Err(EvalError::EmptyOperand { position: 1 }));
        assert_eq!(eval("1+"), Err(EvalError::EmptyOperand { position: 2 }));
        assert_eq!(eval("+1"), Err(EvalError::EmptyOperand { position: 0 }));
        // No unary minus
        assert!(matches!(eval("-1"), Err(EvalError::EmptyOperand { .. })));
        assert!(matches!(eval("1 * *"), Err(EvalError::NotAValue { .. })));
    }

    #[test]
    fn test_unmatched_parentheses() {
        assert_eq!(
            eval("(1+2"),
            Err(EvalError::UnmatchedParentheses { position: 0 })
        );
        assert_eq!(
            eval("1+2)"),
            Err(EvalError::UnmatchedParentheses { position: 3 })
        );
        assert_eq!(
            eval(")("),
            Err(EvalError::UnmatchedParentheses { position: 0 })
        );
    }

    #[test]
    fn test_missing_operator() {
        assert_eq!(eval("1 2"), Err(EvalError::MissingOperator { position: 1 }));
        assert_eq!(
            eval("(1)(2)"),
            Err(EvalError::MissingOperator { position: 3 })
        );
        assert_eq!(
            eval("*1 2"),
            Err(EvalError::MissingOperator { position: 2 })
        );
    }

    #[test]
    fn test_parenthesized_groups_are_not_wrapped() {
        assert_eq!(eval("(1)+(2)").unwrap(), 3);
        assert_eq!(eval("((2))*((3))").unwrap(), 6);
        assert_eq!(eval("((((7))))").unwrap(), 7);
    }

    #[test]
    fn test_not_a_value() {
        let m = machine();
        let tokens = tokenize("+").unwrap();
        assert_eq!(
            evaluate(&tokens, &m.registers, &m.memory),
            Err(EvalError::NotAValue {
                token: "+".to_string()
            })
        );
    }

    #[test]
    fn test_nested_evaluations_are_independent() {
        let m = machine();
        let mut outer = tokenize("(1 + 2) * 3").unwrap();
        let mut inner = tokenize("8 - 3 - 2").unwrap();
        reclassify_dereference(&mut outer);
        reclassify_dereference(&mut inner);

        let evaluator = Evaluator::new(&m.registers, &m.memory);
        let first = evaluator.eval(&outer).unwrap();
        let second = evaluator.eval(&inner).unwrap();
        assert_eq!(evaluator.eval(&outer).unwrap(), first);
        assert_eq!((first, second), (9, 3));
    }

    /// Random expression trees, rendered with the fewest parentheses the
    /// precedence rules allow, checked against the tree's own value.
    mod generated {
        use super::*;

        struct Lcg(u64);

        impl Lcg {
            fn next(&mut self) -> u32 {
                self.0 = self
                    .0
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (self.0 >> 33) as u32
            }

            fn choose(&mut self, n: u32) -> u32 {
                self.next() % n
            }
        }

        enum Node {
            Num(Word),
            Bin(TokenKind, Box<Node>, Box<Node>),
        }

        const OPS: [TokenKind; 7] = [
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::And,
        ];

        fn generate(rng: &mut Lcg, depth: u32) -> Node {
            if depth == 0 || rng.choose(3) == 0 {
                // Small values so that divisions by zero actually occur
                let value = match rng.choose(3) {
                    0 => rng.choose(4),
                    1 => rng.choose(100),
                    _ => rng.next(),
                };
                return Node::Num(value);
            }
            let op = OPS[rng.choose(OPS.len() as u32) as usize].clone();
            Node::Bin(
                op,
                Box::new(generate(rng, depth - 1)),
                Box::new(generate(rng, depth - 1)),
            )
        }

        fn value(node: &Node) -> Result<Word, EvalError> {
            match node {
                Node::Num(v) => Ok(*v),
                Node::Bin(op, l, r) => {
                    let l = value(l)?;
                    let r = value(r)?;
                    apply_binop(op, l, r)
                }
            }
        }

        fn class(node: &Node) -> u8 {
            match node {
                Node::Num(_) => 0,
                Node::Bin(op, ..) => op.precedence().unwrap_or(0),
            }
        }

        fn render(node: &Node, rng: &mut Lcg, out: &mut String) {
            match node {
                Node::Num(v) => {
                    if rng.choose(2) == 0 {
                        out.push_str(&format!("{:#x}", v));
                    } else {
                        out.push_str(&v.to_string());
                    }
                }
                Node::Bin(op, l, r) => {
                    let own = op.precedence().unwrap_or(0);
                    let left_parens = class(l) > own || rng.choose(5) == 0;
                    let right_parens = (class(r) >= own && class(r) > 0) || rng.choose(5) == 0;
                    render_child(l, left_parens, rng, out);
                    out.push(' ');
                    out.push_str(op.as_str());
                    out.push(' ');
                    render_child(r, right_parens, rng, out);
                }
            }
        }

        fn render_child(node: &Node, parens: bool, rng: &mut Lcg, out: &mut String) {
            if parens {
                out.push('(');
            }
            render(node, rng, out);
            if parens {
                out.push(')');
            }
        }

        #[test]
        fn test_generated_expressions() {
            let m = machine();
            let mut rng = Lcg(0x5eed);

            for _ in 0..500 {
                let tree = generate(&mut rng, 4);
                let mut text = String::new();
                render(&tree, &mut rng, &mut text);

                let expected = value(&tree);
                let actual = eval_with(&m, &text);
                assert_eq!(actual, expected, "expression: {}", text);
            }
        }
    }
}
