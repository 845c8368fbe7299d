// ============================================================
// Layer 5 — End-to-End Memory Network
// ============================================================
// Shapes (b = batch, m = memsize, s = sentence_size, q = qlen,
//         d = hdim, V = vocab_size, K = num_candidates):
//
//   u0      = Σ_q  B[question] ⊙ PE_q                    [b, d]
//   for each hop h:
//     m     = Σ_s  A[h][story] ⊙ PE_s  + TA[h]           [b, m, d]
//     c     = Σ_s  C[h][story]         + TC[h]           [b, m, d]
//     score = m · u                                      [b, m]
//     p     = softmax(score)  (raw score in TrainRaw)    [b, m]
//     o     = Σ_m  p ⊙ c                                 [b, d]
//     u     = u H + o                                    [b, d]
//   logits  = u W                                        [b, K]
//
// H is shared across hops. Every embedding lookup maps the
// padding id to the zero vector.
//
// Reference: Sukhbaatar et al. (2015) End-To-End Memory Networks

use burn::{
    module::Param,
    prelude::*,
    tensor::{activation::softmax, Distribution},
};

use crate::error::MemNetError;
use crate::ml::embedding::{masked_lookup, padding_mask};
use crate::ml::loss::cross_entropy;
use crate::ml::mode::RunMode;
use crate::ml::position::position_encoding_tensor;

#[derive(Config, Debug)]
pub struct MemN2NConfig {
    pub hdim:           usize,
    pub num_hops:       usize,
    pub memsize:        usize,
    pub sentence_size:  usize,
    pub qlen:           usize,
    pub vocab_size:     usize,
    pub num_candidates: usize,
    /// Standard deviation of the N(0, σ) parameter initialiser
    #[config(default = 0.1)]
    pub init_std:       f64,
    /// A memory slot is dropped when its uniform draw is ≤ this
    #[config(default = 0.1)]
    pub drop_threshold: f64,
}

impl MemN2NConfig {
    /// Every dimension must be positive. `num_hops = 0` is allowed and
    /// yields a model that answers from the question encoding alone.
    pub fn validate(&self) -> crate::error::Result<()> {
        let dims = [
            ("hdim",           self.hdim),
            ("memsize",        self.memsize),
            ("sentence_size",  self.sentence_size),
            ("qlen",           self.qlen),
            ("vocab_size",     self.vocab_size),
            ("num_candidates", self.num_candidates),
        ];
        match dims.iter().find(|(_, value)| *value == 0) {
            Some(&(field, value)) => Err(MemNetError::InvalidConfig { field, value }),
            None => Ok(()),
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> crate::error::Result<MemN2N<B>> {
        self.validate()?;

        let hops: Vec<HopParams<B>> = (0..self.num_hops)
            .map(|_| HopParams {
                a:  self.random_param([self.vocab_size, self.hdim], device),
                c:  self.random_param([self.vocab_size, self.hdim], device),
                ta: self.random_param([self.memsize, self.hdim], device),
                tc: self.random_param([self.memsize, self.hdim], device),
            })
            .collect();

        Ok(MemN2N {
            b: self.random_param([self.vocab_size, self.hdim], device),
            h: self.random_param([self.hdim, self.hdim], device),
            w: self.random_param([self.hdim, self.num_candidates], device),
            hops,
            sentence_encoding: position_encoding_tensor(self.sentence_size, self.hdim, device),
            question_encoding: position_encoding_tensor(self.qlen, self.hdim, device),
            padding_mask:      padding_mask(self.vocab_size, self.hdim, device),
            hdim:              self.hdim,
            memsize:           self.memsize,
            sentence_size:     self.sentence_size,
            qlen:              self.qlen,
            vocab_size:        self.vocab_size,
            num_candidates:    self.num_candidates,
        })
    }

    fn random_param<B: Backend, const D: usize>(
        &self,
        shape:  [usize; D],
        device: &B::Device,
    ) -> Param<Tensor<B, D>> {
        Param::from_tensor(Tensor::random(shape, Distribution::Normal(0.0, self.init_std), device))
    }
}

/// Per-hop parameters: key/value tables and their temporal biases.
#[derive(Module, Debug)]
pub struct HopParams<B: Backend> {
    /// Key embedding table A[h]: [vocab_size, hdim]
    pub a:  Param<Tensor<B, 2>>,
    /// Value embedding table C[h]: [vocab_size, hdim]
    pub c:  Param<Tensor<B, 2>>,
    /// Temporal bias for keys TA[h]: [memsize, hdim]
    pub ta: Param<Tensor<B, 2>>,
    /// Temporal bias for values TC[h]: [memsize, hdim]
    pub tc: Param<Tensor<B, 2>>,
}

#[derive(Module, Debug)]
pub struct MemN2N<B: Backend> {
    /// Question embedding table: [vocab_size, hdim]
    pub b:    Param<Tensor<B, 2>>,
    /// Shared hop transition: [hdim, hdim]
    pub h:    Param<Tensor<B, 2>>,
    /// Answer projection: [hdim, num_candidates]
    pub w:    Param<Tensor<B, 2>>,
    pub hops: Vec<HopParams<B>>,

    // Constants: never trained.
    pub sentence_encoding: Tensor<B, 2>,
    pub question_encoding: Tensor<B, 2>,
    pub padding_mask:      Tensor<B, 2>,

    pub hdim:           usize,
    pub memsize:        usize,
    pub sentence_size:  usize,
    pub qlen:           usize,
    pub vocab_size:     usize,
    pub num_candidates: usize,
}

/// Which embedding table a lookup goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTable {
    Question,
    Key(usize),
    Value(usize),
}

impl<B: Backend> MemN2N<B> {
    pub fn num_hops(&self) -> usize {
        self.hops.len()
    }

    /// ids: [rows, len] → [rows, len, hdim], padding rows zeroed.
    ///
    /// # Panics
    /// If a Key/Value hop index is ≥ `num_hops()`.
    pub fn lookup(&self, table: EmbeddingTable, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let weights = match table {
            EmbeddingTable::Question => self.b.val(),
            EmbeddingTable::Key(hop)   => self.hops[hop].a.val(),
            EmbeddingTable::Value(hop) => self.hops[hop].c.val(),
        };
        masked_lookup(weights, self.padding_mask.clone(), ids)
    }

    /// Initial query state u0: questions [b, q] → [b, d]
    pub fn encode_question(&self, questions: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch, qlen] = questions.dims();
        let embedded = self.lookup(EmbeddingTable::Question, questions);
        let weights  = self.question_encoding.clone()
            .unsqueeze::<3>()
            .expand([batch, qlen, self.hdim]);
        (embedded * weights).sum_dim(1).reshape([batch, self.hdim])
    }

    /// Sum each memory slot's token embeddings: stories [b, m, s] → [b, m, d].
    /// With `positional`, tokens are weighted by the sentence encoding first.
    fn encode_memory(
        &self,
        table:      EmbeddingTable,
        stories:    Tensor<B, 3, Int>,
        positional: bool,
    ) -> Tensor<B, 3> {
        let [batch, memsize, sentence_size] = stories.dims();
        let rows     = batch * memsize;
        let embedded = self.lookup(table, stories.reshape([rows, sentence_size]));
        let embedded = if positional {
            embedded * self.sentence_encoding.clone()
                .unsqueeze::<3>()
                .expand([rows, sentence_size, self.hdim])
        } else {
            embedded
        };
        embedded.sum_dim(1).reshape([batch, memsize, self.hdim])
    }

    /// One attention hop: (u, stories, hop) → next u.
    ///
    /// # Panics
    /// If `hop` ≥ `num_hops()`.
    pub fn hop(
        &self,
        u:       Tensor<B, 2>,
        stories: Tensor<B, 3, Int>,
        hop:     usize,
        mode:    RunMode,
    ) -> Tensor<B, 2> {
        let [batch, memsize, _] = stories.dims();
        let params   = &self.hops[hop];
        let temporal = |bias: &Param<Tensor<B, 2>>| {
            bias.val().unsqueeze::<3>().expand([batch, memsize, self.hdim])
        };

        let keys   = self.encode_memory(EmbeddingTable::Key(hop), stories.clone(), true)
            + temporal(&params.ta);
        let values = self.encode_memory(EmbeddingTable::Value(hop), stories, false)
            + temporal(&params.tc);

        let query  = u.clone().unsqueeze_dim::<3>(1).expand([batch, memsize, self.hdim]);
        let scores = (keys * query).sum_dim(2).reshape([batch, memsize]);
        let attention = if mode.uses_softmax() {
            softmax(scores, 1)
        } else {
            scores
        };

        let output = (attention.unsqueeze_dim::<3>(2).expand([batch, memsize, self.hdim]) * values)
            .sum_dim(1)
            .reshape([batch, self.hdim]);

        u.matmul(self.h.val()) + output
    }

    /// Terminal query state after every hop: [b, d]
    pub fn query_state(
        &self,
        stories:   Tensor<B, 3, Int>,
        questions: Tensor<B, 2, Int>,
        mode:      RunMode,
    ) -> Tensor<B, 2> {
        let mut u = self.encode_question(questions);
        for hop in 0..self.num_hops() {
            u = self.hop(u, stories.clone(), hop, mode);
        }
        u
    }

    /// stories [b, m, s], questions [b, q] → logits [b, K]
    pub fn forward(
        &self,
        stories:   Tensor<B, 3, Int>,
        questions: Tensor<B, 2, Int>,
        mode:      RunMode,
    ) -> Tensor<B, 2> {
        self.query_state(stories, questions, mode).matmul(self.w.val())
    }

    /// Returns (mean batch loss [1], logits [b, K]).
    pub fn forward_loss(
        &self,
        stories:   Tensor<B, 3, Int>,
        questions: Tensor<B, 2, Int>,
        answers:   Tensor<B, 1, Int>,
        mode:      RunMode,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(stories, questions, mode);
        let loss   = cross_entropy(logits.clone(), answers);
        (loss, logits)
    }

    /// Reject batches whose shapes or ids do not fit this model.
    /// Nothing is truncated or padded here.
    pub fn check_batch(
        &self,
        stories:   &Tensor<B, 3, Int>,
        questions: &Tensor<B, 2, Int>,
        answers:   Option<&Tensor<B, 1, Int>>,
    ) -> crate::error::Result<()> {
        let [batch, _, _] = stories.dims();
        if batch == 0 {
            return Err(MemNetError::EmptyBatch);
        }

        expect_shape("stories", &stories.dims(), &[batch, self.memsize, self.sentence_size])?;
        expect_shape("questions", &questions.dims(), &[batch, self.qlen])?;
        check_ids("stories", stories, self.vocab_size)?;
        check_ids("questions", questions, self.vocab_size)?;

        if let Some(answers) = answers {
            expect_shape("answers", &answers.dims(), &[batch])?;
            check_ids("answers", answers, self.num_candidates)?;
        }
        Ok(())
    }
}

fn expect_shape(tensor: &'static str, actual: &[usize], expected: &[usize]) -> crate::error::Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(MemNetError::ShapeMismatch {
            tensor,
            expected: expected.to_vec(),
            actual:   actual.to_vec(),
        })
    }
}

fn check_ids<B: Backend, const D: usize>(
    tensor: &'static str,
    ids:    &Tensor<B, D, Int>,
    bound:  usize,
) -> crate::error::Result<()> {
    let min = ids.clone().min().into_scalar().elem::<i64>();
    let max = ids.clone().max().into_scalar().elem::<i64>();
    if min < 0 {
        return Err(MemNetError::TokenOutOfRange { tensor, id: min, bound });
    }
    if max >= bound as i64 {
        return Err(MemNetError::TokenOutOfRange { tensor, id: max, bound });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn config() -> MemN2NConfig {
        // vocab 20, hdim 4, 2 hops, memsize 3, sentence 4, qlen 3, 20 candidates
        MemN2NConfig::new(4, 2, 3, 4, 3, 20, 20)
    }

    fn inputs(
        device: &<TestBackend as Backend>::Device,
    ) -> (Tensor<TestBackend, 3, Int>, Tensor<TestBackend, 2, Int>, Tensor<TestBackend, 1, Int>) {
        let story_ids: Vec<i32> = (0..24).map(|i| (i * 7 + 3) % 20).collect();
        let stories   = Tensor::<TestBackend, 1, Int>::from_ints(story_ids.as_slice(), device)
            .reshape([2, 3, 4]);
        let questions = Tensor::<TestBackend, 1, Int>::from_ints([5, 9, 0, 11, 2, 0], device)
            .reshape([2, 3]);
        let answers   = Tensor::<TestBackend, 1, Int>::from_ints([4, 17], device);
        (stories, questions, answers)
    }

    fn to_vec(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_rejects_non_positive_dimensions() {
        let cfg = MemN2NConfig::new(0, 2, 3, 4, 3, 20, 20);
        assert!(matches!(
            cfg.validate(),
            Err(MemNetError::InvalidConfig { field: "hdim", .. })
        ));

        let cfg = MemN2NConfig::new(4, 2, 3, 4, 3, 20, 0);
        assert!(matches!(
            cfg.init::<TestBackend>(&Default::default()),
            Err(MemNetError::InvalidConfig { field: "num_candidates", .. })
        ));
    }

    #[test]
    fn test_end_to_end_forward() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device).unwrap();
        let (stories, questions, answers) = inputs(&device);

        model.check_batch(&stories, &questions, Some(&answers)).unwrap();
        for mode in [RunMode::TrainRaw, RunMode::TrainSoftmax, RunMode::Eval] {
            let (loss, logits) = model.forward_loss(
                stories.clone(), questions.clone(), answers.clone(), mode,
            );
            assert_eq!(logits.dims(), [2, 20]);
            let loss = loss.into_scalar().elem::<f64>();
            assert!(loss.is_finite());
            let acc = crate::ml::loss::accuracy(logits, answers.clone());
            assert!((0.0..=1.0).contains(&acc));
        }
    }

    #[test]
    fn test_eval_is_deterministic() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device).unwrap();
        let (stories, questions, answers) = inputs(&device);

        let (loss1, logits1) = model.forward_loss(stories.clone(), questions.clone(), answers.clone(), RunMode::Eval);
        let (loss2, logits2) = model.forward_loss(stories, questions, answers, RunMode::Eval);
        assert_eq!(
            loss1.into_scalar().elem::<f64>(),
            loss2.into_scalar().elem::<f64>()
        );
        assert_eq!(to_vec(logits1), to_vec(logits2));
    }

    #[test]
    fn test_padding_lookups_are_zero_for_every_table() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device).unwrap();
        let ids    = Tensor::<TestBackend, 1, Int>::from_ints([0, 0], &device).reshape([1, 2]);

        let mut tables = vec![EmbeddingTable::Question];
        for hop in 0..model.num_hops() {
            tables.push(EmbeddingTable::Key(hop));
            tables.push(EmbeddingTable::Value(hop));
        }
        for table in tables {
            let values = model.lookup(table, ids.clone()).into_data().to_vec::<f32>().unwrap();
            assert!(values.iter().all(|&v| v == 0.0), "{table:?} leaked padding");
        }
    }

    #[test]
    fn test_zero_hops_uses_question_encoding_only() {
        let device = Default::default();
        let cfg    = MemN2NConfig::new(4, 0, 3, 4, 3, 20, 20);
        let model  = cfg.init::<TestBackend>(&device).unwrap();
        let (stories, questions, _) = inputs(&device);

        let u0 = model.encode_question(questions.clone());
        let u  = model.query_state(stories.clone(), questions.clone(), RunMode::Eval);
        assert_eq!(to_vec(u0), to_vec(u));

        // Replacing H must not move the logits
        let before = model.forward(stories.clone(), questions.clone(), RunMode::Eval);
        let mut other = model.clone();
        other.h = Param::from_tensor(Tensor::ones([4, 4], &device));
        let after = other.forward(stories, questions, RunMode::Eval);
        assert_eq!(to_vec(before), to_vec(after));
    }

    #[test]
    fn test_raw_and_softmax_attention_differ() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device).unwrap();
        let (stories, questions, _) = inputs(&device);

        let raw     = model.forward(stories.clone(), questions.clone(), RunMode::TrainRaw);
        let softmax = model.forward(stories.clone(), questions.clone(), RunMode::TrainSoftmax);
        let eval    = model.forward(stories, questions, RunMode::Eval);

        // TrainSoftmax and Eval share the attention path; noise is applied outside the model
        assert_eq!(to_vec(softmax.clone()), to_vec(eval));
        assert_ne!(to_vec(raw), to_vec(softmax));
    }

    #[test]
    fn test_single_hop_matches_hand_computation() {
        let device = Default::default();
        // hdim 1, 1 hop, memsize 2, sentence 1, qlen 1, vocab 3, 2 candidates
        let mut model = MemN2NConfig::new(1, 1, 2, 1, 1, 3, 2)
            .init::<TestBackend>(&device)
            .unwrap();
        let column = |values: [f32; 3]| {
            Param::from_tensor(Tensor::<TestBackend, 1>::from_floats(values, &device).reshape([3, 1]))
        };
        let pair = |values: [f32; 2]| {
            Param::from_tensor(Tensor::<TestBackend, 1>::from_floats(values, &device).reshape([2, 1]))
        };
        model.b        = column([9.0, 2.0, 0.0]);
        model.hops[0].a  = column([9.0, 1.0, 3.0]);
        model.hops[0].c  = column([9.0, 5.0, 7.0]);
        model.hops[0].ta = pair([0.5, 0.0]);
        model.hops[0].tc = pair([0.0, 1.0]);
        model.h = Param::from_tensor(Tensor::from_floats([[2.0]], &device));
        model.w = Param::from_tensor(Tensor::from_floats([[1.0, -1.0]], &device));

        // Single-word sentences and questions have encoding weight 1.
        let stories   = Tensor::<TestBackend, 1, Int>::from_ints([1, 2], &device).reshape([1, 2, 1]);
        let questions = Tensor::<TestBackend, 1, Int>::from_ints([1], &device).reshape([1, 1]);

        // u0 = 2; keys = [1.5, 3]; values = [5, 8]
        // raw:     p = [3, 6]            → o = 63          → u = 4 + 63 = 67
        let raw = to_vec(model.query_state(stories.clone(), questions.clone(), RunMode::TrainRaw));
        assert!((raw[0] - 67.0).abs() < 1e-4);

        // softmax: p = softmax([3, 6])   → o = 5 p0 + 8 p1 → u = 4 + o
        let p1 = 1.0 / (1.0 + (-3.0f32).exp());
        let expected = 4.0 + 5.0 * (1.0 - p1) + 8.0 * p1;
        let soft = to_vec(model.query_state(stories.clone(), questions.clone(), RunMode::Eval));
        assert!((soft[0] - expected).abs() < 1e-4);

        let logits = to_vec(model.forward(stories, questions, RunMode::Eval));
        assert!((logits[0] - expected).abs() < 1e-4);
        assert!((logits[1] + expected).abs() < 1e-4);
    }

    #[test]
    fn test_keys_and_question_are_position_weighted_values_are_not() {
        let device = Default::default();
        // hdim 2, 1 hop, memsize 1, sentence 2, qlen 2, vocab 4, 1 candidate
        let mut model = MemN2NConfig::new(2, 1, 1, 2, 2, 4, 1)
            .init::<TestBackend>(&device)
            .unwrap();
        let table = |rows: [[f32; 2]; 4]| Param::from_tensor(Tensor::<TestBackend, 2>::from_floats(rows, &device));
        model.b          = table([[9.0, 9.0], [1.0, 2.0], [3.0, 0.0], [0.0, 0.0]]);
        model.hops[0].a  = table([[9.0, 9.0], [1.0, 0.0], [2.0, 1.0], [0.0, 0.0]]);
        model.hops[0].c  = table([[9.0, 9.0], [2.0, 0.0], [0.0, 5.0], [0.0, 0.0]]);
        model.hops[0].ta = Param::from_tensor(Tensor::zeros([1, 2], &device));
        model.hops[0].tc = Param::from_tensor(Tensor::zeros([1, 2], &device));
        model.h = Param::from_tensor(Tensor::from_floats([[1.0, 0.0], [0.0, 1.0]], &device));

        // L = D = 2 weights: position 1 → [1.25, 0.75], position 2 → [0.75, 1.25]
        let questions = Tensor::<TestBackend, 2, Int>::from_ints([[1, 2]], &device);
        let stories   = Tensor::<TestBackend, 1, Int>::from_ints([2, 1], &device).reshape([1, 1, 2]);

        // u0 = [1*1.25, 2*0.75] + [3*0.75, 0*1.25] = [3.5, 1.5]
        let u0 = to_vec(model.encode_question(questions.clone()));
        assert!((u0[0] - 3.5).abs() < 1e-5 && (u0[1] - 1.5).abs() < 1e-5, "u0 {u0:?}");

        // key   = [2*1.25, 1*0.75] + [1*0.75, 0*1.25] = [3.25, 0.75]
        // value = [0, 5] + [2, 0]                     = [2, 5]
        // score = 3.25*3.5 + 0.75*1.5 = 12.5
        // raw:  u = u0 + 12.5 * [2, 5] = [28.5, 64]
        let raw = to_vec(model.query_state(stories.clone(), questions.clone(), RunMode::TrainRaw));
        assert!((raw[0] - 28.5).abs() < 1e-4 && (raw[1] - 64.0).abs() < 1e-4, "raw {raw:?}");

        // one slot: softmax weight 1, u = u0 + [2, 5]
        let eval = to_vec(model.query_state(stories, questions, RunMode::Eval));
        assert!((eval[0] - 5.5).abs() < 1e-5 && (eval[1] - 6.5).abs() < 1e-5, "eval {eval:?}");
    }

    #[test]
    fn test_check_batch_rejects_bad_shapes() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device).unwrap();
        let (_, questions, answers) = inputs(&device);

        let wrong_memsize = Tensor::<TestBackend, 3, Int>::zeros([2, 5, 4], &device);
        assert!(matches!(
            model.check_batch(&wrong_memsize, &questions, Some(&answers)),
            Err(MemNetError::ShapeMismatch { tensor: "stories", .. })
        ));

        let stories   = Tensor::<TestBackend, 3, Int>::zeros([2, 3, 4], &device);
        let long_q    = Tensor::<TestBackend, 2, Int>::zeros([2, 6], &device);
        assert!(matches!(
            model.check_batch(&stories, &long_q, None),
            Err(MemNetError::ShapeMismatch { tensor: "questions", .. })
        ));

        let short_answers = Tensor::<TestBackend, 1, Int>::zeros([1], &device);
        assert!(matches!(
            model.check_batch(&stories, &questions, Some(&short_answers)),
            Err(MemNetError::ShapeMismatch { tensor: "answers", .. })
        ));

        let empty = Tensor::<TestBackend, 3, Int>::zeros([0, 3, 4], &device);
        assert!(matches!(
            model.check_batch(&empty, &questions, None),
            Err(MemNetError::EmptyBatch)
        ));
    }

    #[test]
    fn test_check_batch_rejects_out_of_range_ids() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device).unwrap();
        let (stories, questions, _) = inputs(&device);

        let bad_questions = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 20, 0, 0, 0], &device)
            .reshape([2, 3]);
        assert!(matches!(
            model.check_batch(&stories, &bad_questions, None),
            Err(MemNetError::TokenOutOfRange { tensor: "questions", id: 20, bound: 20 })
        ));

        let bad_answers = Tensor::<TestBackend, 1, Int>::from_ints([-1, 3], &device);
        assert!(matches!(
            model.check_batch(&stories, &questions, Some(&bad_answers)),
            Err(MemNetError::TokenOutOfRange { tensor: "answers", id: -1, .. })
        ));
    }
}
