use crate::config::options::ProjectOptions;
use crate::expression::eval::{CompiledExpr, ExprVars};
use crate::foundation::core::{Rational, Resolution};
use crate::foundation::error::{TileviewError, TileviewResult};
use crate::frame::video::StreamProps;
use crate::transform::matrix::{deg_to_rad, rad_to_deg};

/// Output stream geometry resolved from the options and the input stream.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputGeometry {
    /// Projected luma size.
    pub resolution: Resolution,
    /// Output sample aspect ratio.
    pub sar: Rational,
    /// View horizontal field of view after `ecoef` expansion, degrees.
    pub fovx: f64,
    /// View vertical field of view after `ecoef` expansion, degrees.
    pub fovy: f64,
}

/// Crop offset evaluated for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CropOffset {
    /// Offset computed from the `x`/`y` expressions after clamping and alignment.
    pub computed: (i32, i32),
    /// Offset actually applied to the input planes. Always `(0, 0)`.
    pub applied: (i32, i32),
}

/// Per-frame values visible to the crop offset expressions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct FrameVars {
    pub(crate) n: u64,
    pub(crate) t: Option<f64>,
    pub(crate) pos: Option<i64>,
}

/// Expression environment of one configured stream.
#[derive(Clone, Debug)]
pub(crate) struct Sizing {
    vars: ExprVars,
    x_expr: CompiledExpr,
    y_expr: CompiledExpr,
    input: Resolution,
    output: Resolution,
    log2_chroma: (u8, u8),
    exact: bool,
    offset: (i32, i32),
}

/// Round `d` to the nearest `i32`, failing on NaN and out-of-range values.
pub(crate) fn normalize_double(d: f64) -> Option<i32> {
    if d.is_nan() || d > f64::from(i32::MAX) || d < f64::from(i32::MIN) {
        return None;
    }
    Some(d.round_ties_even() as i32)
}

/// Widen a field of view by `ecoef` on the tangent plane.
pub fn expand_fov(fov: f64, ecoef: f64) -> f64 {
    rad_to_deg((deg_to_rad(fov / 2.0).tan() * ecoef).atan()) * 2.0
}

fn align_down(v: i32, log2: u8) -> i32 {
    v & !((1i32 << log2) - 1)
}

/// Chroma planes must keep at least one pixel each way.
fn check_chroma(what: &str, props: &StreamProps, luma: Resolution) -> TileviewResult<()> {
    let chroma = props.format.plane_resolution(1, luma);
    if chroma.is_empty() {
        return Err(TileviewError::configuration(format!(
            "{what} size {}x{} leaves an empty {}x{} chroma plane for {}",
            luma.width, luma.height, chroma.width, chroma.height, props.format
        )));
    }
    Ok(())
}

impl Sizing {
    /// Evaluate output size, aspect ratio and fov for `input`.
    pub(crate) fn resolve(
        opts: &ProjectOptions,
        input: &StreamProps,
    ) -> TileviewResult<(Self, OutputGeometry)> {
        let in_res = input.resolution;
        if in_res.is_empty() {
            return Err(TileviewError::configuration(format!(
                "input size must be non-zero, got {}x{}",
                in_res.width, in_res.height
            )));
        }
        let (hsub, vsub) = (input.format.log2_chroma_w(), input.format.log2_chroma_h());
        check_chroma("input", input, in_res)?;
        let (iw, ih) = (f64::from(in_res.width), f64::from(in_res.height));

        let mut vars = ExprVars::new();
        vars.set_all(&["in_w", "iw"], iw);
        vars.set_all(&["in_h", "ih"], ih);
        let a = iw / ih;
        let sar = if input.sar.is_zero() || input.sar.den == 0 {
            1.0
        } else {
            input.sar.as_f64()
        };
        vars.set("a", a);
        vars.set("sar", sar);
        vars.set("dar", a * sar);
        vars.set("hsub", f64::from(1u32 << hsub));
        vars.set("vsub", f64::from(1u32 << vsub));
        vars.set_all(&["out_w", "ow"], f64::NAN);
        vars.set_all(&["out_h", "oh"], f64::NAN);
        vars.set("x", f64::NAN);
        vars.set("y", f64::NAN);
        vars.set("n", 0.0);
        vars.set("t", f64::NAN);
        vars.set("pos", f64::NAN);
        vars.set("fovx", opts.fovx);
        vars.set("fovy", opts.fovy);
        vars.set("xr", opts.xr);
        vars.set("yr", opts.yr);
        vars.set("zr", opts.zr);

        let w_expr = CompiledExpr::compile(&opts.w)?;
        let h_expr = CompiledExpr::compile(&opts.h)?;
        let mut ow = w_expr.eval(&vars)?;
        vars.set_all(&["out_w", "ow"], ow);
        let oh = h_expr.eval(&vars)?;
        vars.set_all(&["out_h", "oh"], oh);
        // Width may depend on height.
        ow = w_expr.eval(&vars)?;
        vars.set_all(&["out_w", "ow"], ow);

        let (Some(mut w), Some(mut h)) = (normalize_double(ow), normalize_double(oh)) else {
            return Err(TileviewError::configuration(format!(
                "too big value or invalid expression for out_w '{}' or out_h '{}' \
                 (maybe self-referencing)",
                opts.w, opts.h
            )));
        };
        if !opts.exact {
            w = align_down(w, hsub);
            h = align_down(h, vsub);
        }

        let out_sar = if opts.keep_aspect {
            let dar_num = i64::from(input.sar.num) * i64::from(in_res.width);
            let dar_den = i64::from(input.sar.den) * i64::from(in_res.height);
            Rational::reduce(dar_num * i64::from(h), dar_den * i64::from(w))
        } else {
            input.sar
        };

        tracing::info!(
            in_w = in_res.width,
            in_h = in_res.height,
            in_sar = %input.sar,
            out_w = w,
            out_h = h,
            out_sar = %out_sar,
            "resolved output size"
        );

        if w <= 0 || h <= 0 {
            return Err(TileviewError::configuration(format!(
                "invalid non positive size for width '{w}' or height '{h}'"
            )));
        }

        let output = Resolution::new(w as u32, h as u32);
        check_chroma("output", input, output)?;

        let x_expr = CompiledExpr::compile(&opts.x)?;
        let y_expr = CompiledExpr::compile(&opts.y)?;

        let iw_i = in_res.width as i32;
        let ih_i = in_res.height as i32;
        let mut offset = ((iw_i - w) / 2, (ih_i - h) / 2);
        if !opts.exact {
            offset = (align_down(offset.0, hsub), align_down(offset.1, vsub));
        }

        let (fovx, fovy) = if opts.ecoef != 1.0 {
            let fx = expand_fov(opts.fovx, opts.ecoef);
            let fy = expand_fov(opts.fovy, opts.ecoef);
            tracing::info!(
                from_fovx = opts.fovx,
                from_fovy = opts.fovy,
                fovx = fx,
                fovy = fy,
                ecoef = opts.ecoef,
                "expanded field of view"
            );
            (fx, fy)
        } else {
            (opts.fovx, opts.fovy)
        };

        let sizing = Self {
            vars,
            x_expr,
            y_expr,
            input: in_res,
            output,
            log2_chroma: (hsub, vsub),
            exact: opts.exact,
            offset,
        };
        let geometry = OutputGeometry {
            resolution: output,
            sar: out_sar,
            fovx,
            fovy,
        };
        Ok((sizing, geometry))
    }

    /// Evaluate the crop offset for one frame.
    ///
    /// A non-finite expression result falls back to the last applied offset (the centered
    /// default before the first frame). The computed offset is clamped into the input and
    /// aligned, but the applied offset is always the origin.
    pub(crate) fn crop_offset(&mut self, frame: FrameVars) -> CropOffset {
        self.vars.set("n", frame.n as f64);
        self.vars.set("t", frame.t.unwrap_or(f64::NAN));
        self.vars.set("pos", frame.pos.map_or(f64::NAN, |p| p as f64));

        let eval = |e: &CompiledExpr, vars: &ExprVars| {
            e.eval(vars).unwrap_or_else(|err| {
                tracing::debug!(expr = e.source(), error = %err, "offset expression failed");
                f64::NAN
            })
        };
        let x = eval(&self.x_expr, &self.vars);
        self.vars.set("x", x);
        let y = eval(&self.y_expr, &self.vars);
        self.vars.set("y", y);
        // x may depend on y.
        let x = eval(&self.x_expr, &self.vars);
        self.vars.set("x", x);

        let (mut cx, mut cy) = self.offset;
        if let Some(v) = normalize_double(x) {
            cx = v;
        }
        if let Some(v) = normalize_double(y) {
            cy = v;
        }

        let (w, h) = (self.output.width as i64, self.output.height as i64);
        let (iw, ih) = (self.input.width as i64, self.input.height as i64);
        let mut cx = i64::from(cx.max(0));
        let mut cy = i64::from(cy.max(0));
        if cx + w > iw {
            cx = iw - w;
        }
        if cy + h > ih {
            cy = ih - h;
        }
        let (mut cx, mut cy) = (cx as i32, cy as i32);
        if !self.exact {
            cx = align_down(cx, self.log2_chroma.0);
            cy = align_down(cy, self.log2_chroma.1);
        }
        self.offset = (0, 0);

        CropOffset {
            computed: (cx, cy),
            applied: (0, 0),
        }
    }

    pub(crate) fn output(&self) -> Resolution {
        self.output
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/sizing.rs"]
mod tests;
