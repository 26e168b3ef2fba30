//! Lowers an expression tree into the LLVM IR body of a single
//! `double -> double` function.

use std::collections::HashMap;

use inkwell::attributes::{Attribute, AttributeLoc};
use inkwell::builder::{Builder, BuilderError};
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::values::{BasicMetadataValueEnum, FloatValue, FunctionValue};

use graphjit_par::{BinaryOp, Node, UnaryOp};

use crate::error::{CodeGenError, Result};

fn wrap(r: std::result::Result<FloatValue<'_>, BuilderError>) -> Result<FloatValue<'_>> {
    r.map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))
}

/// Lowers a [`Node`] tree into the body of a single LLVM function taking
/// one `double` argument and returning a `double`.
pub struct CodeGenerator<'ctx, 'm> {
    context: &'ctx Context,
    module: &'m Module<'ctx>,
    builder: &'m Builder<'ctx>,
    /// Name-keyed cache of declared single-argument (and `pow`'s
    /// two-argument) math intrinsics, so e.g. `sin` used twice in one
    /// expression is declared only once.
    externs: HashMap<String, FunctionValue<'ctx>>,
}

impl<'ctx, 'm> CodeGenerator<'ctx, 'm> {
    pub fn new(context: &'ctx Context, module: &'m Module<'ctx>, builder: &'m Builder<'ctx>) -> Self {
        Self {
            context,
            module,
            builder,
            externs: HashMap::new(),
        }
    }

    /// Builds `double @name(double x)` whose body evaluates `ast`.
    pub fn compile_expression(&mut self, ast: &Node, name: &str) -> Result<FunctionValue<'ctx>> {
        if !ast.is_valid() {
            return Err(CodeGenError::InvalidExpression);
        }

        let f64_type = self.context.f64_type();
        let fn_type = f64_type.fn_type(&[f64_type.into()], false);
        let function = self.module.add_function(name, fn_type, None);

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let x = function
            .get_nth_param(0)
            .ok_or_else(|| CodeGenError::Internal("missing function argument".into()))?
            .into_float_value();
        x.set_name("x");

        let result = self.lower(ast, x)?;
        self.builder
            .build_return(Some(&result))
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;

        Ok(function)
    }

    fn lower(&mut self, node: &Node, x: FloatValue<'ctx>) -> Result<FloatValue<'ctx>> {
        match node {
            Node::Error => Err(CodeGenError::InvalidExpression),
            Node::Number(n) => Ok(self.context.f64_type().const_float(*n)),
            Node::Variable => Ok(x),
            Node::Unary { op, operand } => {
                let v = self.lower(operand, x)?;
                match op {
                    UnaryOp::Positive => Ok(v),
                    UnaryOp::Negative => wrap(self.builder.build_float_neg(v, "negtmp")),
                }
            }
            Node::Binary { op, left, right } => self.lower_binary(*op, left, right, x),
            Node::Function { name, argument } => {
                let arg = self.lower(argument, x)?;
                let callee = self.declare_math_intrinsic(name);
                self.build_tail_call(callee, &[arg.into()], "funccalltmp")
            }
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Node,
        right: &Node,
        x: FloatValue<'ctx>,
    ) -> Result<FloatValue<'ctx>> {
        let lhs = self.lower(left, x)?;
        let rhs = self.lower(right, x)?;
        match op {
            BinaryOp::Add => wrap(self.builder.build_float_add(lhs, rhs, "addtmp")),
            BinaryOp::Sub => wrap(self.builder.build_float_sub(lhs, rhs, "subtmp")),
            BinaryOp::Mul => wrap(self.builder.build_float_mul(lhs, rhs, "multmp")),
            BinaryOp::Div => wrap(self.builder.build_float_div(lhs, rhs, "divtmp")),
            BinaryOp::Pow => {
                // The parser already folds `pow(pow(b,e1),e2)` into a
                // single `Pow` node and constant-folds literal operands,
                // so by the time a `Pow` node reaches codegen neither
                // operand is a nested `Pow` and both being literals would
                // already have collapsed to a `Number`.
                let callee = self.declare_math_intrinsic("pow");
                self.build_tail_call(callee, &[lhs.into(), rhs.into()], "powtmp")
            }
        }
    }

    fn build_tail_call(
        &self,
        callee: FunctionValue<'ctx>,
        args: &[BasicMetadataValueEnum<'ctx>],
        name: &str,
    ) -> Result<FloatValue<'ctx>> {
        let call = self
            .builder
            .build_call(callee, args, name)
            .map_err(|e| CodeGenError::LlvmOperationFailed(e.to_string()))?;
        call.set_tail_call(true);
        call.try_as_basic_value()
            .left()
            .map(|v| v.into_float_value())
            .ok_or_else(|| CodeGenError::Internal(format!("call to {name} produced no value")))
    }

    /// Declares (once) an external function matching a host libm symbol,
    /// resolved at JIT link time, and marks it `readnone`, `nounwind`,
    /// `alwaysinline`.
    fn declare_math_intrinsic(&mut self, name: &str) -> FunctionValue<'ctx> {
        if let Some(existing) = self.externs.get(name) {
            return *existing;
        }

        let f64_type = self.context.f64_type();
        let arity = if name == "pow" { 2 } else { 1 };
        let param_types = vec![f64_type.into(); arity];
        let fn_type = f64_type.fn_type(&param_types, false);
        let function = self.module.add_function(name, fn_type, Some(Linkage::External));

        for attr_name in ["readnone", "nounwind", "alwaysinline"] {
            let kind_id = Attribute::get_named_enum_kind_id(attr_name);
            let attr = self.context.create_enum_attribute(kind_id, 0);
            function.add_attribute(AttributeLoc::Function, attr);
        }

        self.externs.insert(name.to_string(), function);
        function
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphjit_par::{Arena, Parser};
    use graphjit_util::Handler;

    fn compile_ir(source: &str) -> String {
        let cleaned = graphjit_lex_strip(source);
        let mut handler = Handler::new();
        let tokens = graphjit_lex::Lexer::new(&cleaned, &mut handler)
            .lex_all()
            .expect("balanced parens");
        let arena = Arena::new();
        let mut parser = Parser::new(&tokens, &arena, &mut handler);
        let ast = parser.parse_expression();

        let context = Context::create();
        let module = context.create_module("test");
        let builder = context.create_builder();
        let mut gen = CodeGenerator::new(&context, &module, &builder);
        gen.compile_expression(ast, "eval").unwrap();
        module.print_to_string().to_string()
    }

    fn graphjit_lex_strip(s: &str) -> String {
        graphjit_lex::strip_whitespace(s)
    }

    #[test]
    fn test_variable_returns_argument() {
        let ir = compile_ir("x");
        assert!(ir.contains("define double @eval(double %x)"));
        assert!(ir.contains("ret double %x"));
    }

    #[test]
    fn test_addition_emits_fadd() {
        let ir = compile_ir("x+1");
        assert!(ir.contains("fadd"));
    }

    #[test]
    fn test_sin_declares_extern_and_calls_it() {
        let ir = compile_ir("sin(x)");
        assert!(ir.contains("declare double @sin(double)"));
        assert!(ir.contains("call double @sin"));
    }

    #[test]
    fn test_repeated_function_declared_once() {
        let ir = compile_ir("sin(x)+sin(x)");
        assert_eq!(ir.matches("declare double @sin").count(), 1);
    }

    #[test]
    fn test_pow_lowers_to_libm_pow_call() {
        let ir = compile_ir("x^2");
        assert!(ir.contains("declare double @pow(double, double)"));
        assert!(ir.contains("call double @pow"));
    }
}
