use neurite::{
    Activation,
    DenseLayer,
    Loss,
    NeuralNetwork,
    SGD,
    Tensor,
};
use csv;
use std::error::Error;
use std::path::Path;

const NUM_CLASSES: usize = 10;
const NUM_PIXELS: usize = 784;

fn load_mnist(file_path: &Path) -> Result<(Vec<Tensor>, Vec<Tensor>), Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(file_path)?;

    let mut inputs = Vec::new();
    let mut targets = Vec::new();

    for result in reader.records() {
        let record = result?;

        let label = record[0].parse::<usize>()?;

        let pixels: Vec<f64> = record.iter()
            .skip(1)
            .map(|pixel| pixel.parse::<f64>().unwrap_or(0.0) / 255.0)
            .collect();
        inputs.push(Tensor::from_vec(pixels, (1, NUM_PIXELS, 1))?);

        let mut one_hot = vec![0.0; NUM_CLASSES];
        one_hot[label] = 1.0;
        targets.push(Tensor::from_vec(one_hot, (1, NUM_CLASSES, 1))?);
    }

    Ok((inputs, targets))
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("Loading MNIST data...");
    let (x_train, y_train) = load_mnist(Path::new("./input/mnist_train.csv"))?;
    let (x_test, y_test) = load_mnist(Path::new("./input/mnist_test.csv"))?;
    println!("Data loaded successfully.");
    println!("Training samples: {}, Test samples: {}", x_train.len(), x_test.len());

    let mut model = NeuralNetwork::new(Loss::CrossEntropy, SGD::new(0.01));
    model.add_layer(DenseLayer::new(NUM_PIXELS, 128, Some(Activation::relu()))?)?;
    model.add_layer(DenseLayer::new(128, NUM_CLASSES, Some(Activation::softmax()))?)?;

    println!("\nStarting training...");
    model.train(&x_train, &y_train, 5, 32)?;
    println!("Training finished.");

    println!("\nEvaluating model on test data...");
    let predictions = model.predict(&x_test)?;

    let mut correct_predictions = 0;
    for (prediction, target) in predictions.iter().zip(y_test.iter()) {
        if argmax(prediction.data()) == argmax(target.data()) {
            correct_predictions += 1;
        }
    }

    let accuracy = correct_predictions as f64 / y_test.len() as f64;
    println!("Test Accuracy: {:.2}%", accuracy * 100.0);

    Ok(())
}
