use anyhow::Result;
use image::{imageops::FilterType, RgbImage};
use notecam_proto::DetectionReport;
use std::{ffi::CString, os::raw::{c_char, c_int, c_void}, ptr, time::Instant};
use tracing::info;

use crate::{nms_filter, postprocess_ultralytics, Candidate, Detector, DetectorConfig};

#[repr(C)]
struct TfLiteModel;
#[repr(C)]
struct TfLiteInterpreterOptions;
#[repr(C)]
struct TfLiteInterpreter;
#[repr(C)]
struct TfLiteTensor;
#[repr(C)]
struct TfLiteDelegate;

#[link(name = "tensorflowlite_c")]
extern "C" {
    fn TfLiteModelCreateFromFile(model_path: *const c_char) -> *mut TfLiteModel;
    fn TfLiteModelDelete(model: *mut TfLiteModel);

    fn TfLiteInterpreterOptionsCreate() -> *mut TfLiteInterpreterOptions;
    fn TfLiteInterpreterOptionsDelete(options: *mut TfLiteInterpreterOptions);
    fn TfLiteInterpreterOptionsSetNumThreads(options: *mut TfLiteInterpreterOptions, num_threads: c_int);
    fn TfLiteInterpreterOptionsAddDelegate(options: *mut TfLiteInterpreterOptions, delegate: *mut TfLiteDelegate);

    fn TfLiteInterpreterCreate(model: *const TfLiteModel, options: *const TfLiteInterpreterOptions) -> *mut TfLiteInterpreter;
    fn TfLiteInterpreterDelete(interpreter: *mut TfLiteInterpreter);

    fn TfLiteInterpreterAllocateTensors(interpreter: *mut TfLiteInterpreter) -> c_int;
    fn TfLiteInterpreterInvoke(interpreter: *mut TfLiteInterpreter) -> c_int;

    fn TfLiteInterpreterGetInputTensor(interpreter: *mut TfLiteInterpreter, index: c_int) -> *mut TfLiteTensor;
    fn TfLiteInterpreterGetOutputTensor(interpreter: *mut TfLiteInterpreter, index: c_int) -> *const TfLiteTensor;

    fn TfLiteTensorData(tensor: *const TfLiteTensor) -> *mut c_void;
    fn TfLiteTensorByteSize(tensor: *const TfLiteTensor) -> usize;

    fn TfLiteTensorNumDims(tensor: *const TfLiteTensor) -> c_int;
    fn TfLiteTensorDim(tensor: *const TfLiteTensor, dim_index: c_int) -> c_int;
}

#[cfg(feature = "vision-coral")]
#[link(name = "edgetpu")]
extern "C" {
    fn edgetpu_create_delegate(device_type: c_int, device_path: *const c_char, options: *const c_char) -> *mut TfLiteDelegate;
    fn edgetpu_free_delegate(delegate: *mut TfLiteDelegate);
}

/// Owns the C handles. Anything still null was never created.
struct Interpreter {
    model: *mut TfLiteModel,
    opts: *mut TfLiteInterpreterOptions,
    raw: *mut TfLiteInterpreter,
    #[cfg(feature = "vision-coral")]
    delegate: *mut TfLiteDelegate,
}

impl Interpreter {
    fn open(model_path: &str, use_coral: bool) -> Result<Self> {
        let cpath = CString::new(model_path)?;
        let mut it = Self {
            model: unsafe { TfLiteModelCreateFromFile(cpath.as_ptr()) },
            opts: ptr::null_mut(),
            raw: ptr::null_mut(),
            #[cfg(feature = "vision-coral")]
            delegate: ptr::null_mut(),
        };
        anyhow::ensure!(!it.model.is_null(), "failed to load tflite model: {}", model_path);

        it.opts = unsafe { TfLiteInterpreterOptionsCreate() };
        anyhow::ensure!(!it.opts.is_null(), "failed to create tflite options");
        unsafe { TfLiteInterpreterOptionsSetNumThreads(it.opts, 2) };

        if use_coral {
            it.attach_edgetpu()?;
        }

        it.raw = unsafe { TfLiteInterpreterCreate(it.model, it.opts) };
        anyhow::ensure!(!it.raw.is_null(), "failed to create tflite interpreter");
        let rc = unsafe { TfLiteInterpreterAllocateTensors(it.raw) };
        anyhow::ensure!(rc == 0, "TfLiteInterpreterAllocateTensors failed ({})", rc);
        Ok(it)
    }

    #[cfg(feature = "vision-coral")]
    fn attach_edgetpu(&mut self) -> Result<()> {
        self.delegate = unsafe { edgetpu_create_delegate(0, ptr::null(), ptr::null()) };
        anyhow::ensure!(!self.delegate.is_null(), "failed to create EdgeTPU delegate");
        unsafe { TfLiteInterpreterOptionsAddDelegate(self.opts, self.delegate) };
        Ok(())
    }

    #[cfg(not(feature = "vision-coral"))]
    fn attach_edgetpu(&mut self) -> Result<()> {
        anyhow::bail!("detector.use_coral=true but binary not built with --features vision-coral")
    }

    fn input(&self) -> Result<Tensor> {
        let t = unsafe { TfLiteInterpreterGetInputTensor(self.raw, 0) };
        anyhow::ensure!(!t.is_null(), "no input tensor");
        Ok(Tensor(t))
    }

    fn output(&self) -> Result<Tensor> {
        let t = unsafe { TfLiteInterpreterGetOutputTensor(self.raw, 0) };
        anyhow::ensure!(!t.is_null(), "no output tensor 0");
        Ok(Tensor(t))
    }

    fn invoke(&mut self) -> Result<()> {
        let rc = unsafe { TfLiteInterpreterInvoke(self.raw) };
        anyhow::ensure!(rc == 0, "TfLiteInterpreterInvoke failed ({})", rc);
        Ok(())
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        unsafe {
            if !self.raw.is_null() {
                TfLiteInterpreterDelete(self.raw);
            }
            if !self.opts.is_null() {
                TfLiteInterpreterOptionsDelete(self.opts);
            }
            if !self.model.is_null() {
                TfLiteModelDelete(self.model);
            }
            // the delegate must outlive the interpreter that uses it
            #[cfg(feature = "vision-coral")]
            if !self.delegate.is_null() {
                edgetpu_free_delegate(self.delegate);
            }
        }
    }
}

/// Borrowed tensor owned by the interpreter.
#[derive(Clone, Copy)]
struct Tensor(*const TfLiteTensor);

impl Tensor {
    fn dims(self) -> Vec<i32> {
        let n = unsafe { TfLiteTensorNumDims(self.0) };
        (0..n).map(|i| unsafe { TfLiteTensorDim(self.0, i) }).collect()
    }

    fn byte_size(self) -> usize {
        unsafe { TfLiteTensorByteSize(self.0) }
    }

    fn data(self) -> Result<*mut c_void> {
        let p = unsafe { TfLiteTensorData(self.0) };
        anyhow::ensure!(!p.is_null(), "null tensor data");
        Ok(p)
    }
}

/// Ultralytics-layout TFLite model, optionally on a Coral EdgeTPU.
pub struct TfliteDetector {
    cfg: DetectorConfig,
    model_id: String,
    engine: &'static str,
    interp: Interpreter,
}

// The interpreter is only touched through &mut self.
unsafe impl Send for TfliteDetector {}

impl TfliteDetector {
    pub fn new(cfg: DetectorConfig) -> Result<Self> {
        let model_path = match (&cfg.model_path_edgetpu, cfg.use_coral) {
            (Some(p), true) => p.clone(),
            (None, true) => anyhow::bail!("detector.use_coral=true but detector.model_path_edgetpu is missing"),
            (_, false) => cfg.model_path.clone(),
        };
        let interp = Interpreter::open(&model_path, cfg.use_coral)?;

        let engine = if cfg.use_coral { "tflite+edgetpu" } else { "tflite-cpu" };
        let model_id = cfg.resolved_model_id();
        info!("vision: loaded {} ({}) from {}", model_id, engine, model_path);
        Ok(Self { cfg, model_id, engine, interp })
    }

    /// Tensor shapes, for matching `detector.output_layout` to a model.
    pub fn inspect(&mut self) -> Result<String> {
        let input = self.interp.input()?;
        let output = self.interp.output()?;
        Ok(format!(
            "TFLite inspect:\n- input[0] dims={:?} bytes={}\n- output[0] dims={:?} bytes={}\n",
            input.dims(),
            input.byte_size(),
            output.dims(),
            output.byte_size()
        ))
    }

    fn run(&mut self, frame: &RgbImage, confidence: f32) -> Result<Vec<Candidate>> {
        let (w, h) = (self.cfg.img_w, self.cfg.img_h);
        let resized = image::imageops::resize(frame, w, h, FilterType::Triangle);

        // u8 RGB input (quantized / edgetpu models)
        let input = self.interp.input()?;
        let need = (w * h * 3) as usize;
        anyhow::ensure!(input.byte_size() >= need, "input tensor too small: {} < {}", input.byte_size(), need);
        let dst = input.data()? as *mut u8;
        unsafe { ptr::copy_nonoverlapping(resized.as_raw().as_ptr(), dst, need) };

        self.interp.invoke()?;

        let out = self.interp.output()?;
        let dims = out.dims();
        let (num_preds, stride) = match dims.as_slice() {
            [1, n, s] | [n, s] => (*n as usize, *s as usize),
            other => anyhow::bail!(
                "unexpected output dims {:?}. Run `notecam inspect` and check detector.output_layout.",
                other
            ),
        };

        let num_classes = self.cfg.class_names.len();
        anyhow::ensure!(
            stride == 5 + num_classes,
            "stride mismatch: got {}, expected {} for {} class names. output dims {:?}",
            stride,
            5 + num_classes,
            num_classes,
            dims
        );

        let len = out.byte_size() / std::mem::size_of::<f32>();
        let raw = unsafe { std::slice::from_raw_parts(out.data()? as *const f32, len) };
        let cands = match self.cfg.output_layout.as_str() {
            "ultralytics" => postprocess_ultralytics(raw, num_preds, num_classes, confidence),
            other => anyhow::bail!("unsupported output_layout: {} (dims={:?})", other, dims),
        };
        Ok(nms_filter(cands, self.cfg.nms_iou_threshold, self.cfg.max_detections))
    }
}

impl Detector for TfliteDetector {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn engine(&self) -> &str {
        self.engine
    }

    fn labels(&self) -> &[String] {
        &self.cfg.class_names
    }

    fn detect(&mut self, frame: &RgbImage, confidence: f32) -> Result<DetectionReport> {
        let t0 = Instant::now();
        let detections = self
            .run(frame, confidence)?
            .iter()
            .map(|c| c.to_detection(&self.cfg.class_names, frame.width(), frame.height()))
            .collect();
        Ok(DetectionReport { detections, duration: t0.elapsed() })
    }
}
