//! JIT host: turns a compiled LLVM module into a callable native function.

use std::sync::Once;

use inkwell::context::Context;
use inkwell::execution_engine::ExecutionEngine;
use inkwell::passes::PassManager;
use inkwell::targets::{InitializationConfig, Target};
use inkwell::values::FunctionValue;
use inkwell::OptimizationLevel;

use graphjit_par::Node;

use crate::codegen::CodeGenerator;
use crate::error::{CodeGenError, Result};

type EvalFn = unsafe extern "C" fn(f64) -> f64;

static NATIVE_TARGET_INIT: Once = Once::new();

/// Initializes the native target, asm printer, and asm parser exactly
/// once per process. `create_jit_execution_engine` requires this
/// registration to have happened before it can find a backend for the
/// host machine; without it every JIT creation fails.
fn ensure_native_target_initialized() {
    NATIVE_TARGET_INIT.call_once(|| {
        Target::initialize_native(&InitializationConfig::default())
            .expect("failed to initialize native JIT target");
    });
}

/// Compiles an expression tree into native code.
///
/// Each call gets its own LLVM context and module; nothing is shared or
/// reused across compilations, matching the one-shot, single-threaded
/// way this pipeline is invoked (one graph, one compile).
pub fn compile(ast: &Node, symbol_name: &str) -> Result<CompiledFunction> {
    ensure_native_target_initialized();

    // Leaked deliberately: `ExecutionEngine`'s lifetime parameter must
    // reach past this function's stack frame for `CompiledFunction` to
    // own it. The leak is temporary — `CompiledFunction::drop`
    // reconstructs the box and drops it after the engine.
    let context_ptr: *mut Context = Box::into_raw(Box::new(Context::create()));
    let context: &'static Context = unsafe { &*context_ptr };

    let module = context.create_module(symbol_name);
    let builder = context.create_builder();

    let mut generator = CodeGenerator::new(context, &module, &builder);
    let function = match generator.compile_expression(ast, symbol_name) {
        Ok(f) => f,
        Err(e) => {
            unsafe { drop(Box::from_raw(context_ptr)) };
            return Err(e);
        }
    };

    run_optimizations(&module, function);

    let build_result = (|| -> Result<CompiledFunction> {
        let engine = module
            .create_jit_execution_engine(OptimizationLevel::Aggressive)
            .map_err(|e| CodeGenError::JitCreationFailed(e.to_string()))?;

        let address = engine
            .get_function_address(symbol_name)
            .map_err(|_| CodeGenError::SymbolLookupFailed(symbol_name.to_string()))?;

        // Safety: `address` was just resolved from a function we compiled
        // above with exactly this `double (*)(double)` signature.
        let fn_ptr: EvalFn = unsafe { std::mem::transmute::<usize, EvalFn>(address) };

        Ok(CompiledFunction::new(engine, context_ptr, fn_ptr))
    })();

    if build_result.is_err() {
        unsafe { drop(Box::from_raw(context_ptr)) };
    }
    build_result
}

/// Runs the instruction-combining and dead-code-elimination passes over
/// `function` — the two optimizations this pipeline always applies,
/// e.g. folding `1 + x - 0.5` down to `x + 0.5`.
fn run_optimizations(module: &inkwell::module::Module<'_>, function: FunctionValue<'_>) {
    let fpm = PassManager::create(module);
    fpm.add_instruction_combining_pass();
    fpm.add_dead_code_elimination_pass();
    fpm.initialize();
    fpm.run_on(&function);
}

/// A compiled `(f64) -> f64` function, owning the JIT state that keeps
/// its code alive.
///
/// Move-only (no `Clone`/`Copy`): there is exactly one owner of the
/// underlying JIT instance at a time. Dropping it tears down the
/// execution engine (and the JIT-compiled code with it) before
/// reclaiming the LLVM context, so the function pointer this type holds
/// never outlives the memory it points into.
pub struct CompiledFunction {
    engine: ExecutionEngine<'static>,
    context: *mut Context,
    fn_ptr: EvalFn,
}

impl CompiledFunction {
    fn new(engine: ExecutionEngine<'static>, context: *mut Context, fn_ptr: EvalFn) -> Self {
        Self {
            engine,
            context,
            fn_ptr,
        }
    }

    /// Evaluates the compiled expression at `x`.
    pub fn call(&self, x: f64) -> f64 {
        unsafe { (self.fn_ptr)(x) }
    }
}

impl Drop for CompiledFunction {
    fn drop(&mut self) {
        // The engine (and the native code it owns) must go before the
        // context whose memory that code's module descriptors live in.
        unsafe {
            std::ptr::drop_in_place(&mut self.engine);
            drop(Box::from_raw(self.context));
        }
    }
}

// Raw pointers disable the auto-derived Send/Sync; JIT-compiled code and
// the LLVM state backing it are not safe to share across threads here,
// which matches this pipeline's single-threaded execution model.

#[cfg(test)]
mod tests {
    use super::*;
    use graphjit_par::{Arena, Parser};
    use graphjit_util::Handler;

    fn compile_expr(source: &str) -> CompiledFunction {
        let cleaned = graphjit_lex::strip_whitespace(source);
        let mut handler = Handler::new();
        let tokens = graphjit_lex::Lexer::new(&cleaned, &mut handler)
            .lex_all()
            .expect("balanced parens");
        let arena = Arena::new();
        let mut parser = Parser::new(&tokens, &arena, &mut handler);
        let ast = parser.parse_expression();
        compile(ast, "eval").expect("compiles")
    }

    #[test]
    fn test_identity() {
        let f = compile_expr("x");
        assert_eq!(f.call(3.0), 3.0);
    }

    #[test]
    fn test_arithmetic() {
        let f = compile_expr("2*x+1");
        assert_eq!(f.call(5.0), 11.0);
    }

    #[test]
    fn test_sin_zero() {
        let f = compile_expr("sin(x)");
        assert!((f.call(0.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_power() {
        let f = compile_expr("x^2");
        assert_eq!(f.call(4.0), 16.0);
    }

    #[test]
    fn test_nested_power_rewrite_still_evaluates_correctly() {
        let f = compile_expr("(x^2)^3");
        assert_eq!(f.call(2.0), 64.0);
    }

    #[test]
    fn test_constant_expression() {
        let f = compile_expr("2+3*4");
        assert_eq!(f.call(0.0), 14.0);
    }
}
